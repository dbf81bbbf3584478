//! WebSocket events for remote overlays.
//!
//! A connected client first receives the current busy state, then one event
//! per change. Slow clients skip intermediate states and always catch up to
//! the latest one.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes current state
//! - `state_changed` - Sent after every store mutation that changed the state
//!
//! Non-finite progress (stored as given by in-process callers) is sent as
//! `"progress": null` and parses back as NaN.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::presentation::OverlayView;
use crate::state::{BusyState, BusyStatus};

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The busy state at connection time.
    pub state: BusyState,
}

/// Payload for the `state_changed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangedPayload {
    /// The new busy state.
    pub state: BusyState,
    /// Derived status of `state`.
    pub status: BusyStatus,
    /// What an overlay should show for `state`.
    pub view: OverlayView,
    /// When the change was observed.
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Enum
// ============================================================================

/// WebSocket event types for overlay clients.
///
/// All events are serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum OverlayEvent {
    /// Sent when a client connects.
    Connected(ConnectedPayload),
    /// Sent when the busy state changes.
    StateChanged(StateChangedPayload),
}

impl OverlayEvent {
    /// Creates a `Connected` event with the current state.
    #[must_use]
    pub const fn connected(state: BusyState) -> Self {
        Self::Connected(ConnectedPayload { state })
    }

    /// Creates a `StateChanged` event for a new state.
    #[must_use]
    pub fn state_changed(state: BusyState) -> Self {
        Self::StateChanged(StateChangedPayload {
            status: state.status(),
            view: OverlayView::from_state(&state),
            state,
            timestamp: Utc::now(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::StateChanged(_) => "state_changed",
        }
    }

    /// The state carried by the event.
    #[must_use]
    pub const fn state(&self) -> &BusyState {
        match self {
            Self::Connected(payload) => &payload.state,
            Self::StateChanged(payload) => &payload.state,
        }
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// WebSocket upgrade handler for `/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a single WebSocket connection.
///
/// - Sends `connected` with the current state immediately
/// - Sends `state_changed` after every store change
/// - Sends heartbeat pings at the configured interval
/// - Closes the connection after 3 missed pongs
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the snapshot so no change falls in between
    let mut changes = state.store.subscribe();
    let current = changes.borrow_and_update().clone();

    let connected_json = match serde_json::to_string(&OverlayEvent::connected(current)) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize connected event: {}", e);
            return;
        }
    };

    if sender.send(Message::Text(connected_json)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected, sent initial state");

    let period = state.config.server.heartbeat();
    let mut heartbeat_interval = interval_at(Instant::now() + period, period);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested close");
                        break;
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        debug!("Ignoring data message from client");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            changed = changes.changed() => {
                if changed.is_err() {
                    info!("Busy store closed");
                    break;
                }

                let snapshot = changes.borrow_and_update().clone();
                let json = match serde_json::to_string(&OverlayEvent::state_changed(snapshot)) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize event: {}", e);
                        continue;
                    }
                };

                if sender.send(Message::Text(json)).await.is_err() {
                    debug!("Failed to send event, client disconnected");
                    break;
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!("Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!("Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
