//! Test fixtures for integration tests
//!
//! Booking API payloads, a proxy-list sample and helpers wiring clients to a
//! mock server.

use seatwatch::config::EndpointConfig;
use seatwatch::crawler::{ClientSettings, Extractor, HttpExtractor, StaticHeaders};
use serde_json::{json, Value};
use std::sync::Arc;

pub const CINEMA_ID: &str = "1030";
pub const CINEMA_NAME: &str = "Vimercate";
pub const FILM_ID: &str = "HO00003077";
pub const FILM_TITLE: &str = "The Conjuring: Il rito finale";

pub const SHOWINGS_PATH: &str = "/api/microservice/showings/cinemas/1030/films";
pub const SEATS_PATH_REGEX: &str = r"^/api/microservice/booking/Session/1030/\d+/seats$";

/// Five proxies as published by the proxy-list API
pub const PROXY_RESPONSE: &str = r#"{"data":[
{"_id":"662a76a76fb9cbee37969d17","ip":"116.100.220.220","anonymityLevel":"elite","asn":"AS7552","city":"Hanoi","country":"VN","created_at":"2024-04-25T15:28:39.254Z","google":false,"isp":"Viettel Corporation","lastChecked":1758272716,"latency":184.703,"org":"Viettel Group","port":"1080","protocols":["socks4"],"speed":1,"upTime":59.28843020097773,"upTimeSuccessCount":2183,"upTimeTryCount":3682,"updated_at":"2025-09-19T09:05:16.492Z","responseTime":2711},
{"_id":"662a000a6fb9cbee37852713","ip":"102.165.125.102","anonymityLevel":"elite","asn":"AS37521","country":"NG","created_at":"2024-04-25T07:02:11.876Z","google":false,"lastChecked":1758272716,"latency":129.744,"org":"Internet Solutions Nigeria Limited","port":"5678","protocols":["socks4"],"speed":1,"upTime":98.09782608695652,"upTimeSuccessCount":3610,"upTimeTryCount":3680,"updated_at":"2025-09-19T09:05:16.585Z","city":"Ikeja","isp":"Internet Solutions Nigeria Limited","responseTime":4220},
{"_id":"6659e8666fb9cbee3787eb84","ip":"187.95.82.53","anonymityLevel":"elite","asn":"AS262696","city":"Araçariguama","country":"BR","created_at":"2024-05-31T15:10:30.503Z","google":false,"isp":"Turbonet Telecomunicações","lastChecked":1758272716,"latency":208.46,"org":"Turbonet Telecomunicações","port":"3629","protocols":["socks4"],"speed":1,"upTime":99.23887587822014,"upTimeSuccessCount":3390,"upTimeTryCount":3416,"updated_at":"2025-09-19T09:05:16.582Z","responseTime":2205},
{"_id":"662a20d26fb9cbee378a405b","ip":"34.43.181.55","anonymityLevel":"elite","asn":"AS396982","city":"Mountain View","country":"US","created_at":"2024-04-25T09:22:26.286Z","google":false,"isp":"Google LLC","lastChecked":1758272716,"latency":3.257,"org":"Google LLC","port":"3128","protocols":["socks5"],"speed":1,"upTime":99.9729510413849,"upTimeSuccessCount":3696,"upTimeTryCount":3697,"updated_at":"2025-09-19T09:05:16.582Z","responseTime":3516},
{"_id":"661bf21f6fb9cbee378e8bb4","ip":"209.159.153.22","anonymityLevel":"elite","asn":"AS19318","city":"Secaucus","country":"US","created_at":"2024-04-14T15:11:27.922Z","google":false,"isp":"Interserver, Inc","lastChecked":1758272716,"latency":82.662,"org":"Interserver, Inc","port":"15817","protocols":["socks4"],"speed":1,"upTime":80.63063063063063,"upTimeSuccessCount":3043,"upTimeTryCount":3774,"updated_at":"2025-09-19T09:05:16.491Z","responseTime":3116}
],"total":11111,"page":1,"limit":5}"#;

/// Showings payload for one film: `groups` consecutive days from
/// 2025-09-15, two sessions a day, session ids counting up from `first_session`
pub fn showings_body(film_id: &str, title: &str, groups: usize, first_session: u32) -> Value {
    let mut next_id = first_session;
    let showing_groups: Vec<Value> = (0..groups)
        .map(|day| {
            let date = format!("2025-09-{:02}", 15 + day);
            let sessions: Vec<Value> = ["18:00", "21:15"]
                .iter()
                .map(|time| {
                    let id = next_id;
                    next_id += 1;
                    json!({
                        "sessionId": id.to_string(),
                        "startTime": format!("{date}T{time}:00"),
                    })
                })
                .collect();
            json!({ "date": format!("{date}T00:00:00"), "sessions": sessions })
        })
        .collect();

    json!({
        "result": [{
            "filmId": film_id,
            "filmTitle": title,
            "showingGroups": showing_groups,
        }]
    })
}

/// A film that is listed but has nothing scheduled
pub fn unscheduled_body(film_id: &str) -> Value {
    json!({ "result": [{ "filmId": film_id, "filmTitle": "Unscheduled", "showingGroups": [] }] })
}

/// `rows` × 10 seat grid, one gap per row, with the given occupancy fraction
pub fn seats_body(rows: usize, occupancy: f64) -> Value {
    let row: Vec<Value> = (0..10)
        .map(|col| {
            if col == 5 {
                Value::Null
            } else {
                json!({ "seatStatus": 0 })
            }
        })
        .collect();
    let seat_rows: Vec<Value> = (0..rows).map(|_| json!({ "columns": row })).collect();

    json!({ "result": { "seatRows": seat_rows, "sessionOccupancy": occupancy } })
}

pub fn cinemas_body() -> Value {
    json!({
        "result": [
            { "cinemas": [{ "cinemaId": CINEMA_ID, "cinemaName": CINEMA_NAME }] }
        ]
    })
}

pub fn films_body() -> Value {
    json!({
        "result": [
            { "filmId": FILM_ID, "filmTitle": FILM_TITLE },
            { "filmId": "HO00000001", "filmTitle": "Unscheduled" }
        ]
    })
}

/// Endpoints rooted at the mock server
pub fn endpoints(base_url: &str) -> EndpointConfig {
    EndpointConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    }
}

/// Direct, unlimited client against the mock server
pub fn direct_extractor(base_url: &str) -> Arc<dyn Extractor> {
    let headers = Arc::new(StaticHeaders::new(Some("session=test")).unwrap());
    let extractor =
        HttpExtractor::direct(&ClientSettings::default(), headers, endpoints(base_url)).unwrap();
    Arc::new(extractor)
}
