//! Wire types of the account backend.
//!
//! Every response body is wrapped as `{"data": ...}`; field names are
//! camelCase except where the backend says otherwise.

use serde::{Deserialize, Serialize};

/// Kind of account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// A learner; the default.
    #[default]
    Student,
    /// Course administrator.
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The signed-in user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sign-in email address.
    pub email: String,
    /// Kind of account.
    pub account_type: UserRole,
    /// Join date as sent by the backend; not interpreted.
    pub join_date: String,
    /// Number of courses the user is enrolled in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses_enrolled: Option<u32>,
    /// Number of courses the user has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courses_completed: Option<u32>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Payload of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Bearer token for authenticated calls.
    pub access_token: String,
    /// Token for a later refresh flow.
    pub refresh_token: String,
    /// The signed-in user.
    pub user: User,
}

/// Response wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The wrapped payload.
    pub data: T,
}

/// Body of `POST /api/v1/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Sign-in email address.
    pub email: String,
    /// Plain password, sent over the configured transport.
    pub password: String,
}

/// Body of `POST /api/v1/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name for the new account.
    pub user_name: String,
    /// Email address for the new account.
    pub email: String,
    /// Password for the new account.
    pub password: String,
}

/// Body of `POST /api/v1/auth/update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name.
    pub name: String,
    /// New email address.
    pub email: String,
}
