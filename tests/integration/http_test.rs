//! Integration tests for the HTTP surface.

mod helpers;

use axum::http::StatusCode;

use helpers::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;

    let response = server.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["uptime_seconds"].is_u64());
    server.stop();
}

#[tokio::test]
async fn test_stats_reflect_connections() {
    let server = TestServer::start().await;
    let _client = server.ws().await;
    server.wait_until("connection", |s| s.connections == 1).await;

    let response = server.request("GET", "/api/stats", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["connections"], 1);
    assert_eq!(response.body["data"]["metrics"]["connections_total"], 1);
    assert_eq!(response.body["data"]["sessions"][0]["state"], "connected");
    server.stop();
}

#[tokio::test]
async fn test_ingest_rejects_malformed_payload() {
    let server = TestServer::start().await;

    let response = server
        .request(
            "POST",
            "/api/events",
            Some(r#"{"event":"payment-update","data":{"orderId":"O1"}}"#),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    server.stop();
}

#[tokio::test]
async fn test_ingest_rejects_socket_only_events() {
    let server = TestServer::start().await;

    let response = server
        .request(
            "POST",
            "/api/events",
            Some(r#"{"event":"agent-location-update","data":{"agentId":"A1","latitude":1,"longitude":2}}"#),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let snapshot = server.snapshot().await;
    assert_eq!(snapshot.agents, 0);
    server.stop();
}

#[tokio::test]
async fn test_ws_route_requires_upgrade() {
    let server = TestServer::start().await;

    let response = server.request("GET", "/ws", None).await;

    assert!(
        response.status.is_client_error(),
        "expected 4xx for a plain GET on /ws, got {}",
        response.status
    );
    server.stop();
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await;

    let response = server.request("GET", "/api/orders", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
    assert_eq!(response.body["message"], "No route for GET /api/orders");
    server.stop();
}
