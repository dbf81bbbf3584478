//! Access and refresh tokens with client-side expiry.
//!
//! The backend does not say how long its tokens live, so expiry is assigned
//! when credentials are issued, from [`AuthConfig`]. There is no refresh
//! flow: once the access token expires the user signs in again.

use std::path::Path;

use chrono::{DateTime, Utc};
use lumina_core::AuthConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, Result};

/// A bearer token with the moment it stops being sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// The opaque token sent as the bearer value.
    pub value: String,
    /// First instant at which the token is no longer used.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Returns `true` once `now` has reached the expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The pair of tokens handed out by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived token sent with authenticated requests.
    pub access: Token,
    /// Long-lived token kept for a later refresh flow.
    pub refresh: Token,
}

impl Credentials {
    /// Stamps freshly issued tokens with the configured lifetimes.
    #[must_use]
    pub fn issue(access: String, refresh: String, config: &AuthConfig) -> Self {
        Self::issue_at(access, refresh, config, Utc::now())
    }

    /// Like [`issue`](Self::issue) with an explicit issue time.
    ///
    /// An expiry past the end of the calendar saturates instead of
    /// overflowing.
    #[must_use]
    pub fn issue_at(
        access: String,
        refresh: String,
        config: &AuthConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access: Token {
                value: access,
                expires_at: expiry(now, config.access_token_ttl()),
            },
            refresh: Token {
                value: refresh,
                expires_at: expiry(now, config.refresh_token_ttl()),
            },
        }
    }

    /// The access token, unless it has expired.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token_at(Utc::now())
    }

    /// The access token at `now`, unless it has expired.
    #[must_use]
    pub fn access_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        (!self.access.is_expired_at(now)).then_some(self.access.value.as_str())
    }

    /// Writes the credentials as JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialsFile` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::credentials_file(path, format!("cannot create directory: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AuthError::credentials_file(path, e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| AuthError::credentials_file(path, format!("cannot write: {e}")))?;
        debug!(path = %path.display(), "Credentials saved");
        Ok(())
    }

    /// Reads credentials saved by [`save`](Self::save).
    ///
    /// A missing file means nobody is signed in and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialsFile` if the file exists but cannot be
    /// read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::credentials_file(path, format!("cannot read: {e}")));
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| AuthError::credentials_file(path, format!("invalid JSON: {e}")))
    }

    /// Deletes the credentials file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialsFile` if the file exists but cannot be
    /// removed.
    pub fn remove(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Credentials removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::credentials_file(path, format!("cannot remove: {e}"))),
        }
    }
}

fn expiry(now: DateTime<Utc>, ttl: chrono::Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
