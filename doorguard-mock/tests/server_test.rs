use axum::http::StatusCode;
use doorguard_api::{RelayStatus, Turn};
use doorguard_mock::device::MockRelay;
use doorguard_mock::server::HttpServer;

#[tokio::test]
async fn test_serves_relay_routes() {
    let mut server = HttpServer::new(MockRelay::new("Bedroom 1", false), 0);
    let address = server.start().await.unwrap();

    let status: RelayStatus = reqwest::get(format!("http://{address}/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status.primary().map(|relay| relay.ison), Some(false));

    let response = reqwest::get(format!("http://{address}/relay/0?turn=on"))
        .await
        .unwrap();
    assert!(response.status().is_success());

    assert!(server.device().is_on().await);
    assert_eq!(server.device().history().await, vec![Turn::On]);
    assert_eq!(server.request_count(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_counts_unrouted_requests() {
    let mut server = HttpServer::new(MockRelay::new("Bedroom 1", false), 0);
    let address = server.start().await.unwrap();

    let response = reqwest::get(format!("http://{address}/settings")).await.unwrap();

    assert_eq!(response.status().as_u16(), StatusCode::NOT_FOUND.as_u16());
    assert_eq!(server.request_count(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let mut server = HttpServer::new(MockRelay::new("Bedroom 2", true), 0);
    assert!(!server.is_running());
    assert!(server.local_addr().is_none());

    let first = server.start().await.unwrap();
    let second = server.start().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.local_addr(), Some(first));

    server.stop().await;
    server.stop().await;
    assert!(!server.is_running());

    assert!(reqwest::get(format!("http://{first}/status")).await.is_err());
}

#[tokio::test]
async fn test_restart_after_stop() {
    let mut server = HttpServer::new(MockRelay::new("Bedroom 3", false), 0);

    server.start().await.unwrap();
    server.stop().await;

    let address = server.start().await.unwrap();
    let response = reqwest::get(format!("http://{address}/status")).await.unwrap();
    assert!(response.status().is_success());

    server.stop().await;
}

#[tokio::test]
async fn test_failing_device_is_still_logged() {
    let relay = MockRelay::new("Bedroom 3", false).failing(StatusCode::INTERNAL_SERVER_ERROR);
    let mut server = HttpServer::new(relay, 0);
    let address = server.start().await.unwrap();

    let response = reqwest::get(format!("http://{address}/status")).await.unwrap();

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(server.request_count(), 1);

    server.stop().await;
}
