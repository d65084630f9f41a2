//! End-to-end pipeline tests against a mock booking API

use super::fixtures::*;
use seatwatch::crawler::{Catalog, FetchPipeline};
use seatwatch::models::WorkItem;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cinema_names() -> HashMap<String, String> {
    HashMap::from([(CINEMA_ID.to_string(), CINEMA_NAME.to_string())])
}

async fn mount_showings(server: &MockServer, film_id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(SHOWINGS_PATH))
        .and(query_param("filmId", film_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_seats(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(SEATS_PATH_REGEX))
        .respond_with(ResponseTemplate::new(200).set_body_json(seats_body(2, 0.5)))
        .mount(server)
        .await;
}

fn pipeline(server: &MockServer) -> FetchPipeline {
    FetchPipeline::builder(direct_extractor(&server.uri()))
        .endpoints(endpoints(&server.uri()))
        .cinema_names(cinema_names())
        .workers(4)
        .request_delay(Duration::ZERO)
        .build()
}

/// One film with eight days of showings comes back fully aggregated
#[tokio::test]
async fn test_pipeline_aggregates_showing_with_seats() {
    let server = MockServer::start().await;
    mount_showings(&server, FILM_ID, showings_body(FILM_ID, FILM_TITLE, 8, 93000)).await;
    mount_seats(&server).await;

    let results = pipeline(&server)
        .run(vec![WorkItem::new(CINEMA_ID, FILM_ID)])
        .await;

    assert_eq!(results.len(), 1);
    let showing = &results[0];
    assert_eq!(showing.cinema_id, CINEMA_ID);
    assert_eq!(showing.cinema_name, CINEMA_NAME);
    assert_eq!(showing.film_id, FILM_ID);
    assert_eq!(showing.film_title, FILM_TITLE);
    assert_eq!(showing.showing_groups.len(), 8);

    for group in &showing.showing_groups {
        assert!(!group.date.is_empty());
        assert!(!group.sessions.is_empty());
        for session in &group.sessions {
            assert!(!session.session_id.is_empty());
            assert!(!session.start_time.is_empty());
            assert!(!session.start_hour.is_empty());
            assert!(!session.rounded_start_hour.is_empty());
            assert_eq!(session.total_seats, 18);
            assert_eq!(session.seats, 9);
        }
    }

    let first = &showing.showing_groups[0].sessions[0];
    assert_eq!(first.start_hour, "18:00");
    assert_eq!(first.rounded_start_hour, "18");
}

/// Films without showing groups never reach the seat stage
#[tokio::test]
async fn test_pipeline_filters_unscheduled_films() {
    let server = MockServer::start().await;
    mount_showings(&server, FILM_ID, showings_body(FILM_ID, FILM_TITLE, 1, 93000)).await;
    mount_showings(&server, "HO00000001", unscheduled_body("HO00000001")).await;
    mount_showings(&server, "HO00000002", serde_json::json!({ "result": [] })).await;
    mount_seats(&server).await;

    let pipeline = pipeline(&server);
    let results = pipeline
        .run(vec![
            WorkItem::new(CINEMA_ID, FILM_ID),
            WorkItem::new(CINEMA_ID, "HO00000001"),
            WorkItem::new(CINEMA_ID, "HO00000002"),
        ])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].film_id, FILM_ID);

    let stats = pipeline.stats();
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.showings_found, 1);
    assert_eq!(stats.empty_showings, 1);
    assert_eq!(stats.aggregated, 1);
    assert_eq!(stats.dropped_items(), 1);

    // only the scheduled film's two sessions were asked for seats
    let seat_requests = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().ends_with("/seats"))
        .count();
    assert_eq!(seat_requests, 2);
}

/// A single failing seat request drops only its own showing
#[tokio::test]
async fn test_seat_failure_drops_only_that_showing() {
    let server = MockServer::start().await;
    mount_showings(&server, FILM_ID, showings_body(FILM_ID, FILM_TITLE, 2, 93000)).await;
    mount_showings(&server, "HO00000009", showings_body("HO00000009", "Other", 2, 94000)).await;

    Mock::given(method("GET"))
        .and(path("/api/microservice/booking/Session/1030/94001/seats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_seats(&server).await;

    let pipeline = pipeline(&server);
    let results = pipeline
        .run(vec![
            WorkItem::new(CINEMA_ID, FILM_ID),
            WorkItem::new(CINEMA_ID, "HO00000009"),
        ])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].film_id, FILM_ID);
    assert_eq!(pipeline.stats().dropped_showings(), 1);

    // every sibling request of the failed showing was still sent
    let other_seat_requests = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path().contains("/Session/1030/9400"))
        .count();
    assert_eq!(other_seat_requests, 4);
}

/// Catalog endpoints feed the cartesian work list
#[tokio::test]
async fn test_catalog_drives_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/microservice/showings/cinemas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cinemas_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/microservice/showings/films"))
        .respond_with(ResponseTemplate::new(200).set_body_json(films_body()))
        .mount(&server)
        .await;
    mount_showings(&server, FILM_ID, showings_body(FILM_ID, FILM_TITLE, 3, 93000)).await;
    mount_showings(&server, "HO00000001", unscheduled_body("HO00000001")).await;
    mount_seats(&server).await;

    let extractor = direct_extractor(&server.uri());
    let catalog = Catalog::load(extractor.as_ref()).await.unwrap();
    assert_eq!(catalog.cinema_name(CINEMA_ID), Some(CINEMA_NAME));

    let items = catalog.work_items();
    assert_eq!(items.len(), 2);

    let results = FetchPipeline::builder(extractor)
        .endpoints(endpoints(&server.uri()))
        .cinema_names(catalog.cinema_names())
        .request_delay(Duration::ZERO)
        .build()
        .run(items)
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].cinema_name, CINEMA_NAME);
    assert_eq!(results[0].showing_groups.len(), 3);
}
