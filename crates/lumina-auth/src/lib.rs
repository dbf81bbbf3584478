//! Lumina account client
//!
//! Talks to the learning backend's account endpoints and keeps the signed-in
//! user, holding the shared busy overlay while requests are in flight.

pub mod client;
pub mod credentials;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;

pub use client::AuthClient;
pub use credentials::{Credentials, Token};
pub use error::{AuthError, Result};
pub use models::{Envelope, LoginData, LoginRequest, RegisterRequest, UpdateProfileRequest, User, UserRole};
pub use notify::{Notification, NotificationBroadcaster, NotificationLevel};
pub use session::{
    AuthSession, MSG_INVALID_CREDENTIALS, MSG_LOGIN_FIELDS, MSG_LOGIN_OK, MSG_LOGOUT_OK,
    MSG_REGISTER_OK, MSG_REQUIRED_FIELDS, MSG_UPDATE_OK,
};
