//! Integration tests for WebSocket tracking and fan-out.

mod helpers;

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use deliveryhub_core::config::{AppConfig, RestaurantScope};

use helpers::{TestServer, WsClient};

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn test_customer_tracks_agent_position() {
    let server = TestServer::start().await;
    let mut agent = server.ws().await;
    let mut customer = server.ws().await;
    server.wait_until("two connections", |s| s.connections == 2).await;

    agent
        .send_event(
            "agent-location-update",
            json!({"agentId": "A1", "orderId": "O1", "latitude": 3.86, "longitude": 11.52}),
        )
        .await;
    server.wait_until("agent presence", |s| s.agents == 1).await;
    customer.expect_silence(QUIET).await;

    customer
        .send_event("track-order", json!({"orderId": "O1", "customerId": "C1"}))
        .await;
    let catch_up = customer.recv_json().await;
    assert_eq!(catch_up["event"], "delivery-location-update");
    assert_eq!(catch_up["data"]["latitude"], 3.86);
    assert_eq!(catch_up["data"]["longitude"], 11.52);
    assert_eq!(catch_up["data"]["orderId"], "O1");
    assert!(catch_up["data"]["timestamp"].is_string());

    agent
        .send_event(
            "agent-location-update",
            json!({"agentId": "A1", "orderId": "O1", "latitude": 3.87, "longitude": 11.53}),
        )
        .await;
    let update = customer.recv_json().await;
    assert_eq!(update["event"], "delivery-location-update");
    assert_eq!(update["data"]["latitude"], 3.87);
    assert_eq!(update["data"]["longitude"], 11.53);

    agent.expect_silence(QUIET).await;
    server.stop();
}

#[tokio::test]
async fn test_latest_tab_wins() {
    let server = TestServer::start().await;
    let mut agent = server.ws().await;
    let mut first_tab = server.ws().await;
    let mut second_tab = server.ws().await;
    server.wait_until("three connections", |s| s.connections == 3).await;

    first_tab.send_event("track-order", json!({"orderId": "42"})).await;
    server.wait_for_messages(1).await;
    second_tab.send_event("track-order", json!({"orderId": "42"})).await;
    server.wait_for_messages(2).await;

    agent
        .send_event(
            "agent-location-update",
            json!({"agentId": "X", "orderId": "42", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;

    let update = second_tab.recv_json().await;
    assert_eq!(update["data"]["orderId"], "42");
    first_tab.expect_silence(QUIET).await;
    server.stop();
}

#[tokio::test]
async fn test_disconnect_cleans_registries() {
    let server = TestServer::start().await;
    let mut client = server.ws().await;

    client
        .send_event(
            "agent-location-update",
            json!({"agentId": "A1", "orderId": "O1", "latitude": 1.0, "longitude": 2.0}),
        )
        .await;
    client.send_event("track-order", json!({"orderId": "O2"})).await;
    server
        .wait_until("registrations", |s| s.agents == 1 && s.watched_orders == 1)
        .await;

    client.close().await;

    let snapshot = server
        .wait_until("cleanup", |s| s.connections == 0)
        .await;
    assert_eq!(snapshot.agents, 0);
    assert_eq!(snapshot.watched_orders, 0);

    // A later subscriber gets no catch-up from the departed agent.
    let mut customer = server.ws().await;
    customer.send_event("track-order", json!({"orderId": "O1"})).await;
    customer.expect_silence(QUIET).await;
    server.stop();
}

#[tokio::test]
async fn test_malformed_frame_keeps_socket_open() {
    let server = TestServer::start().await;
    let mut client = server.ws().await;

    client.send_raw("this is not json").await;
    let error = client.recv_json().await;
    assert_eq!(error["event"], "error");
    assert_eq!(error["data"]["code"], "INVALID_MESSAGE");

    client
        .send_event(
            "agent-location-update",
            json!({"agentId": "A1", "latitude": "north", "longitude": 2.0}),
        )
        .await;
    assert_eq!(client.recv_json().await["event"], "error");

    client.send_event("track-order", json!({"orderId": "O1"})).await;
    let snapshot = server.wait_until("watch", |s| s.watched_orders == 1).await;
    assert_eq!(snapshot.metrics.decode_failures, 2);
    assert_eq!(snapshot.connections, 1);
    server.stop();
}

#[tokio::test]
async fn test_ingested_events_fan_out() {
    let server = TestServer::start().await;
    let mut customer = server.ws().await;
    let mut bystander = server.ws().await;

    customer.send_event("track-order", json!({"orderId": "O7"})).await;
    server.wait_until("watch", |s| s.watched_orders == 1 && s.connections == 2).await;

    let response = server
        .request(
            "POST",
            "/api/events",
            Some(r#"{"event":"order-status-update","data":{"orderId":"O7","status":"on_the_way","restaurantId":"R1","customerId":"C1"}}"#),
        )
        .await;
    assert_eq!(response.status, 202);
    assert_eq!(response.body["data"]["delivered"], 3);

    let status = customer.recv_json().await;
    assert_eq!(status["event"], "order-status-changed");
    assert_eq!(status["data"]["status"], "on_the_way");
    assert_eq!(customer.recv_json().await["event"], "restaurant-order-update");

    let broadcast = bystander.recv_json().await;
    assert_eq!(broadcast["event"], "restaurant-order-update");
    assert_eq!(broadcast["data"]["restaurantId"], "R1");

    let response = server
        .request(
            "POST",
            "/api/events",
            Some(r#"{"event":"payment-update","data":{"orderId":"O7","paymentStatus":"paid"}}"#),
        )
        .await;
    assert_eq!(response.body["data"]["delivered"], 2);
    for client in [&mut customer, &mut bystander] {
        let payment = client.recv_json().await;
        assert_eq!(payment["event"], "payment-status-changed");
        assert_eq!(payment["data"]["paymentStatus"], "paid");
    }
    server.stop();
}

#[tokio::test]
async fn test_status_reaches_restaurant_followers_only() {
    let mut config = AppConfig::default();
    config.realtime.restaurant_scope = RestaurantScope::Subscribers;
    let server = TestServer::start_with(config).await;
    let mut dashboard = server.ws().await;
    let mut bystander = server.ws().await;

    dashboard
        .send_event("watch-restaurant", json!({"restaurantId": "R1"}))
        .await;
    server
        .wait_until("restaurant watch", |s| s.watched_restaurants == 1 && s.connections == 2)
        .await;

    server
        .request(
            "POST",
            "/api/events",
            Some(r#"{"event":"order-status-update","data":{"orderId":"O1","status":"ready","restaurantId":"R1"}}"#),
        )
        .await;

    assert_eq!(dashboard.recv_json().await["event"], "restaurant-order-update");
    bystander.expect_silence(QUIET).await;
    server.stop();
}

#[tokio::test]
async fn test_shutdown_closes_sockets() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(deliveryhub_api::serve(
        listener,
        AppConfig::default(),
        async move {
            let _ = stop_rx.await;
        },
    ));

    let mut client = WsClient::connect(addr).await;
    client.send_event("track-order", json!({"orderId": "O1"})).await;

    stop_tx.send(()).expect("server running");
    client.expect_closed().await;

    tokio::time::timeout(Duration::from_secs(15), server)
        .await
        .expect("server should stop")
        .expect("server task")
        .expect("clean shutdown");
}
