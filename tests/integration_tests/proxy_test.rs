//! Proxy source, manager and client pool tests

use super::fixtures::*;
use seatwatch::config::{EndpointConfig, FallbackPolicy};
use seatwatch::crawler::{ClientPool, ClientSettings, Extractor, HeaderProvider, StaticHeaders};
use seatwatch::proxy::{
    GeonodeProxySource, Proxy, ProxyElement, ProxyManager, ProxySource, WeightedScore,
};
use seatwatch::utils::error::ProxyError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROXY_LIST_PATH: &str = "/api/proxy-list";

async fn proxy_list_server(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROXY_LIST_PATH))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

fn source(server: &MockServer) -> GeonodeProxySource {
    GeonodeProxySource::new(
        format!("{}{}", server.uri(), PROXY_LIST_PATH),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn headers() -> Arc<dyn HeaderProvider> {
    Arc::new(StaticHeaders::new(None).unwrap())
}

#[tokio::test]
async fn test_source_parses_proxy_list() {
    let server =
        proxy_list_server(ResponseTemplate::new(200).set_body_string(PROXY_RESPONSE)).await;

    let proxies = source(&server).get_proxies().await.unwrap();
    let ips: Vec<&str> = proxies.iter().map(|p| p.ip.as_str()).collect();
    assert_eq!(
        ips,
        vec![
            "116.100.220.220",
            "102.165.125.102",
            "187.95.82.53",
            "34.43.181.55",
            "209.159.153.22"
        ]
    );
    assert_eq!(proxies[3].protocols, vec!["socks5"]);
    assert_eq!(proxies[3].port, "3128");
}

#[tokio::test]
async fn test_source_error_status() {
    let server = proxy_list_server(ResponseTemplate::new(503)).await;
    let err = source(&server).get_proxies().await.unwrap_err();
    assert!(matches!(err, ProxyError::SourceUnreachable(_)));
}

#[tokio::test]
async fn test_source_malformed_body() {
    let server = proxy_list_server(
        ResponseTemplate::new(200).set_body_string(r#"{"data":[{"_id":123,"ip":true}]}"#),
    )
    .await;
    let err = source(&server).get_proxies().await.unwrap_err();
    assert!(matches!(err, ProxyError::Malformed(_)));
}

#[tokio::test]
async fn test_manager_fails_when_source_fails() {
    let server = proxy_list_server(ResponseTemplate::new(500)).await;
    assert!(ProxyManager::new(&source(&server), WeightedScore).await.is_err());
}

#[tokio::test]
async fn test_manager_ranks_proxies() {
    let server =
        proxy_list_server(ResponseTemplate::new(200).set_body_string(PROXY_RESPONSE)).await;
    let manager = ProxyManager::new(&source(&server), WeightedScore).await.unwrap();
    assert_eq!(manager.len(), 5);

    let best = manager.best_proxies(10);
    assert_eq!(best.len(), 5);
    assert!(best.windows(2).all(|w| w[0].score >= w[1].score));
    // lowest latency and highest uptime
    assert_eq!(best[0].proxy.ip, "34.43.181.55");
}

#[tokio::test]
async fn test_manager_rotates_after_use() {
    let server =
        proxy_list_server(ResponseTemplate::new(200).set_body_string(PROXY_RESPONSE)).await;
    let manager = ProxyManager::new(&source(&server), WeightedScore).await.unwrap();

    let first = manager.best_proxies(1);
    assert_eq!(first[0].proxy.ip, "34.43.181.55");

    // let the re-scoring task run
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = manager.best_proxies(1);
    assert_ne!(first[0].proxy.ip, second[0].proxy.ip);
}

fn http_proxy(ip: &str, latency: f64) -> ProxyElement {
    ProxyElement::new(Proxy {
        ip: ip.to_string(),
        port: "8080".to_string(),
        protocols: vec!["http".to_string()],
        latency,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_pool_builds_one_client_per_proxy() {
    let manager = ProxyManager::from_elements(
        vec![
            http_proxy("10.0.0.1", 10.0),
            http_proxy("10.0.0.2", 20.0),
            http_proxy("10.0.0.3", 30.0),
            http_proxy("10.0.0.4", 40.0),
        ],
        Arc::new(WeightedScore),
    );

    let pool = ClientPool::new(
        3,
        &manager,
        headers(),
        &EndpointConfig::default(),
        &ClientSettings::default(),
        FallbackPolicy::Fail,
    )
    .unwrap();
    assert_eq!(pool.size(), 3);
    assert_eq!(pool.available(), 3);

    let client = pool.borrow().await.unwrap();
    assert!(client.proxy.is_some());
    assert_ne!(client.label(), "10.0.0.4:8080");
    assert_eq!(pool.available(), 2);
}

/// Requests made through a pooled client go through its proxy
#[tokio::test]
async fn test_pooled_client_routes_through_proxy() {
    let proxy_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seats_body(1, 1.0)))
        .mount(&proxy_server)
        .await;

    let address = proxy_server.address();
    let proxy = Proxy {
        ip: address.ip().to_string(),
        port: address.port().to_string(),
        protocols: vec!["http".to_string()],
        ..Default::default()
    };
    let manager =
        ProxyManager::from_elements(vec![ProxyElement::new(proxy)], Arc::new(WeightedScore));

    let endpoints = EndpointConfig {
        base_url: "http://booking.invalid".to_string(),
        ..Default::default()
    };
    let pool = ClientPool::new(
        1,
        &manager,
        headers(),
        &endpoints,
        &ClientSettings::default(),
        FallbackPolicy::Fail,
    )
    .unwrap();

    let seats = pool
        .call_seats(&endpoints.seats_url(CINEMA_ID, "93000"))
        .await
        .unwrap();
    assert_eq!(seats.total_seats(), 9);
    assert_eq!(proxy_server.received_requests().await.unwrap().len(), 1);
    assert_eq!(pool.available(), 1);
}

#[tokio::test]
async fn test_empty_proxy_list_fallback() {
    let empty = r#"{"data":[],"total":0,"page":1,"limit":500}"#;
    let server = proxy_list_server(ResponseTemplate::new(200).set_body_string(empty)).await;
    let manager = ProxyManager::new(&source(&server), WeightedScore).await.unwrap();
    assert!(manager.is_empty());
    assert!(manager.best_proxies(5).is_empty());

    let endpoints = EndpointConfig::default();
    let settings = ClientSettings::default();

    let direct =
        ClientPool::new(5, &manager, headers(), &endpoints, &settings, FallbackPolicy::Direct)
            .unwrap();
    assert_eq!(direct.size(), 1);
    assert!(direct.borrow().await.unwrap().proxy.is_none());

    let strict =
        ClientPool::new(5, &manager, headers(), &endpoints, &settings, FallbackPolicy::Fail);
    assert!(matches!(strict, Err(ProxyError::NoProxies)));
}
