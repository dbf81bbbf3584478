//! Integration tests for the remote overlay server.
//!
//! These tests validate WebSocket streaming of busy-state changes, driven both
//! by the HTTP API and by in-process store handles.

use std::net::TcpListener;
use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use lumina_core::{
    create_router, AppState, BusyStatus, BusyStore, Config, OverlayEvent, OverlayView,
};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the test server and returns the WebSocket URL.
async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let ws_url = format!("ws://{addr}/ws");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (ws_url, handle)
}

/// Connects a WebSocket client to the given URL.
async fn connect_client(url: &str) -> WsClient {
    let (ws_stream, _) = connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next text message and parses it as an `OverlayEvent`.
/// Automatically answers ping frames.
async fn receive_event(client: &mut WsClient) -> OverlayEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

fn http_base(ws_url: &str) -> String {
    ws_url.replace("ws://", "http://").replace("/ws", "")
}

// ============================================================================
// Connection Tests
// ============================================================================

/// Tests that a client receives the idle state on connection.
#[tokio::test]
async fn test_client_receives_connected_event_on_connect() {
    let state = AppState::new(Config::default(), BusyStore::new());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    let event = receive_event(&mut client).await;

    match event {
        OverlayEvent::Connected(payload) => {
            assert!(!payload.state.active);
            assert_eq!(payload.state.message, "Loading...");
        }
        other => panic!("Expected Connected event, got: {other:?}"),
    }
}

/// Tests that the connected event carries a state set before connecting.
#[tokio::test]
async fn test_connected_event_contains_current_state() {
    let store = BusyStore::new();
    store.show(Some("Fetching courses..."));
    store.set_progress(40.0);

    let (ws_url, _handle) = spawn_test_server(AppState::new(Config::default(), store)).await;

    let mut client = connect_client(&ws_url).await;
    let event = receive_event(&mut client).await;

    assert_eq!(event.event_name(), "connected");
    assert!(event.state().active);
    assert_eq!(event.state().message, "Fetching courses...");
    assert_eq!(event.state().status(), BusyStatus::Determinate);
}

// ============================================================================
// Change Streaming Tests
// ============================================================================

/// Tests that in-process store changes reach every client.
#[tokio::test]
async fn test_store_changes_reach_all_clients() {
    let store = BusyStore::new();
    let (ws_url, _handle) =
        spawn_test_server(AppState::new(Config::default(), store.clone())).await;

    let mut client1 = connect_client(&ws_url).await;
    let mut client2 = connect_client(&ws_url).await;
    receive_event(&mut client1).await;
    receive_event(&mut client2).await;

    store.show(Some("Signing in..."));

    for client in [&mut client1, &mut client2] {
        match receive_event(client).await {
            OverlayEvent::StateChanged(payload) => {
                assert!(payload.state.active);
                assert_eq!(payload.status, BusyStatus::Indeterminate);
                assert_eq!(
                    payload.view,
                    OverlayView::Indeterminate {
                        message: "Signing in...".to_string()
                    }
                );
            }
            other => panic!("Expected StateChanged event, got: {other:?}"),
        }
    }
}

/// Tests that the HTTP API drives the WebSocket stream.
#[tokio::test]
async fn test_api_triggers_websocket_events() {
    let state = AppState::new(Config::default(), BusyStore::new());
    let (ws_url, _handle) = spawn_test_server(state).await;
    let base = http_base(&ws_url);
    let http = reqwest::Client::new();

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    let response = http
        .post(format!("{base}/api/busy/show"))
        .json(&serde_json::json!({ "message": "Uploading assignment..." }))
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert!(response.status().is_success());

    let event = receive_event(&mut client).await;
    assert_eq!(event.event_name(), "state_changed");
    assert_eq!(event.state().message, "Uploading assignment...");

    http.post(format!("{base}/api/busy/progress"))
        .json(&serde_json::json!({ "value": 62.4 }))
        .send()
        .await
        .expect("Failed to send HTTP request");

    match receive_event(&mut client).await {
        OverlayEvent::StateChanged(payload) => {
            assert_eq!(payload.status, BusyStatus::Determinate);
            assert_eq!(
                payload.view,
                OverlayView::Determinate {
                    message: "Uploading assignment...".to_string(),
                    percent: 62
                }
            );
        }
        other => panic!("Expected StateChanged event, got: {other:?}"),
    }

    http.post(format!("{base}/api/busy/hide"))
        .send()
        .await
        .expect("Failed to send HTTP request");

    let event = receive_event(&mut client).await;
    assert!(!event.state().active);
    assert!(event.state().progress.abs() < f64::EPSILON);
}

/// Tests that a request that changes nothing produces no event.
#[tokio::test]
async fn test_no_event_without_change() {
    let store = BusyStore::new();
    let (ws_url, _handle) =
        spawn_test_server(AppState::new(Config::default(), store.clone())).await;

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    // already idle
    store.hide();
    let quiet = timeout(Duration::from_millis(200), client.next()).await;
    assert!(quiet.is_err(), "Expected no event, got: {quiet:?}");

    store.set_message("Queued");
    let event = receive_event(&mut client).await;
    assert_eq!(event.state().message, "Queued");
}

// ============================================================================
// Disconnection Tests
// ============================================================================

/// Tests that a client can cleanly disconnect.
#[tokio::test]
async fn test_client_can_disconnect() {
    let state = AppState::new(Config::default(), BusyStore::new());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    client
        .close(None)
        .await
        .expect("Failed to close connection");
}

/// Tests that the server keeps streaming after a client disconnects.
#[tokio::test]
async fn test_server_continues_after_client_disconnect() {
    let store = BusyStore::new();
    let (ws_url, _handle) =
        spawn_test_server(AppState::new(Config::default(), store.clone())).await;

    let mut client1 = connect_client(&ws_url).await;
    receive_event(&mut client1).await;
    client1.close(None).await.ok();
    drop(client1);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut client2 = connect_client(&ws_url).await;
    let event = receive_event(&mut client2).await;
    assert_eq!(event.event_name(), "connected");

    store.show(None);
    let event = receive_event(&mut client2).await;
    assert_eq!(event.event_name(), "state_changed");
    assert!(event.state().active);
}
