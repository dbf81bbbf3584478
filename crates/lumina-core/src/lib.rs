//! Lumina busy-state coordinator
//!
//! One shared busy state per client, driven by pending flags in feature code
//! and rendered by a single overlay (in process or over HTTP/WebSocket).

pub mod api;
pub mod config;
pub mod error;
pub mod hook;
pub mod presentation;
pub mod state;
pub mod store;
pub mod websocket;

pub use api::{
    create_router, ActiveRequest, AppState, MessageRequest, ProgressRequest, ShowRequest,
};
pub use config::{
    AuthConfig, Config, ProgressConfig, ServerConfig, BACKEND_URL_ENV, MAX_ACCESS_TOKEN_TTL_HOURS,
    MAX_REFRESH_TOKEN_TTL_DAYS,
};
pub use error::{LuminaError, Result};
pub use hook::{track, BusyHook, BusyRequest, HookGuard, ProgressTicket};
pub use presentation::{render_text, Layout, OverlayMount, OverlayView};
pub use state::{BusyState, BusyStatus, DEFAULT_MESSAGE};
pub use store::BusyStore;
pub use websocket::{ConnectedPayload, OverlayEvent, StateChangedPayload};
