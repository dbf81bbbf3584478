//! HTTP API for remote overlays.
//!
//! Lets an out-of-process presentation layer read and drive the busy store.
//!
//! # Endpoints
//!
//! - `GET /api/busy` - Current busy state
//! - `POST /api/busy/show` - Show the overlay, optionally with a message
//! - `POST /api/busy/hide` - Hide the overlay
//! - `POST /api/busy/active` - Set the active flag
//! - `POST /api/busy/progress` - Report progress
//! - `POST /api/busy/message` - Replace the message
//! - `GET /ws` - WebSocket stream of state changes
//!
//! Every `POST` answers with the state after the change.
//!
//! # Example
//!
//! ```no_run
//! use lumina_core::{create_router, AppState, BusyStore, Config};
//!
//! # async fn example() {
//! let config = Config::default();
//! let state = AppState::new(config, BusyStore::new());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Config;
use crate::state::BusyState;
use crate::store::BusyStore;
use crate::websocket::ws_handler;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for `POST /api/busy/show`. Send `{}` to keep the message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowRequest {
    /// Message to display.
    pub message: Option<String>,
}

/// Request body for `POST /api/busy/active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRequest {
    /// `false` behaves like hide.
    pub active: bool,
}

/// Request body for `POST /api/busy/progress`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    /// Progress value; stored as given.
    pub value: f64,
}

/// Request body for `POST /api/busy/message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    /// The new message.
    pub message: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration for the server.
    pub config: Config,
    /// The busy store driven by this server.
    pub store: BusyStore,
}

impl AppState {
    /// Creates a new `AppState` serving the given store.
    #[must_use]
    pub const fn new(config: Config, store: BusyStore) -> Self {
        Self { config, store }
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries:
/// - the busy routes under `/api/busy`
/// - the WebSocket stream at `/ws`
/// - permissive CORS, since overlays are served from other origins
/// - request tracing
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let busy_routes = Router::new()
        .route("/", get(handle_get_busy))
        .route("/show", post(handle_show))
        .route("/hide", post(handle_hide))
        .route("/active", post(handle_set_active))
        .route("/progress", post(handle_set_progress))
        .route("/message", post(handle_set_message));

    Router::new()
        .nest("/api/busy", busy_routes)
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/busy`.
async fn handle_get_busy(State(state): State<Arc<AppState>>) -> Json<BusyState> {
    Json(state.store.snapshot())
}

/// Handler for `POST /api/busy/show`.
async fn handle_show(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShowRequest>,
) -> Json<BusyState> {
    info!(message = ?request.message, "Remote show");
    state.store.show(request.message.as_deref());
    Json(state.store.snapshot())
}

/// Handler for `POST /api/busy/hide`.
async fn handle_hide(State(state): State<Arc<AppState>>) -> Json<BusyState> {
    info!("Remote hide");
    state.store.hide();
    Json(state.store.snapshot())
}

async fn handle_set_active(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActiveRequest>,
) -> Json<BusyState> {
    info!(active = request.active, "Remote set_active");
    state.store.set_active(request.active);
    Json(state.store.snapshot())
}

async fn handle_set_progress(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProgressRequest>,
) -> Json<BusyState> {
    info!(value = request.value, "Remote set_progress");
    state.store.set_progress(request.value);
    Json(state.store.snapshot())
}

async fn handle_set_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> Json<BusyState> {
    info!(message = %request.message, "Remote set_message");
    state.store.set_message(&request.message);
    Json(state.store.snapshot())
}

// ============================================================================
// Tests
// ============================================================================
