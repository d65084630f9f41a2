//! Error scenario tests
//!
//! Failure responses from the booking API and credential endpoints, and how
//! they are classified.

use super::fixtures::*;
use seatwatch::crawler::headers::CookieSource;
use seatwatch::crawler::{
    ClientSettings, Extractor, HttpCookieSource, HttpExtractor, StaticHeaders,
};
use seatwatch::error::{Error, ErrorCategory, FetchError, SchedulerError};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seats_url(server: &MockServer) -> String {
    endpoints(&server.uri()).seats_url(CINEMA_ID, "93000")
}

#[tokio::test]
async fn test_error_status_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = direct_extractor(&server.uri())
        .call_seats(&seats_url(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));

    let err = Error::from(err);
    assert_eq!(err.category(), ErrorCategory::Transient);
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = direct_extractor(&server.uri())
        .call_showings(&endpoints(&server.uri()).showings_url(CINEMA_ID, FILM_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(seats_body(1, 0.0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let headers = Arc::new(StaticHeaders::new(None).unwrap());
    let extractor = HttpExtractor::direct(&settings, headers, endpoints(&server.uri())).unwrap();

    let err = extractor
        .call_seats(&seats_url(&server))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout));
}

/// The configured cookie goes out with every request
#[tokio::test]
async fn test_cookie_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("cookie", "session=test"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seats_body(1, 0.0)))
        .expect(1)
        .mount(&server)
        .await;

    let seats = direct_extractor(&server.uri())
        .call_seats(&seats_url(&server))
        .await
        .unwrap();
    assert_eq!(seats.total_seats(), 9);
}

#[tokio::test]
async fn test_cookie_source_collects_set_cookie_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .append_header(
                    "set-cookie",
                    "accessTokenExpirationTime=2099-01-01T00%3A00%3A00Z; Path=/",
                ),
        )
        .mount(&server)
        .await;

    let source =
        HttpCookieSource::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
    let cookies = source.fetch_cookies().await.unwrap();
    assert_eq!(
        cookies,
        "sid=abc; accessTokenExpirationTime=2099-01-01T00%3A00%3A00Z"
    );
}

#[tokio::test]
async fn test_missing_cookies_is_setup_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let source = HttpCookieSource::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = source.fetch_cookies().await.unwrap_err();
    assert!(matches!(err, FetchError::Credentials(_)));

    let err = Error::from(err);
    assert_eq!(err.category(), ErrorCategory::Setup);
    assert!(!err.is_recoverable());
}

#[test]
fn test_error_category_mapping() {
    let aggregation = Error::from(FetchError::for_session("93000", FetchError::Timeout));
    assert_eq!(aggregation.category(), ErrorCategory::Aggregation);
    assert!(aggregation.is_recoverable());

    let scheduling = Error::from(SchedulerError::invalid_start_hour("93000", "25:00"));
    assert_eq!(scheduling.category(), ErrorCategory::Scheduling);
    assert!(scheduling.is_recoverable());

    let bootstrap = Error::from(SchedulerError::BootstrapFailed {
        reason: "no showings".to_string(),
    });
    assert!(!bootstrap.is_recoverable());

    assert_eq!(Error::config("bad").category().label(), "config");
}
