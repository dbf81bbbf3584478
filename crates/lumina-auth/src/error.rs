//! Error types for the account client.

use std::path::PathBuf;

/// A specialized `Result` type for account operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors returned by [`crate::AuthClient`] and the credential store.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The request never produced a response (connection, timeout, TLS).
    #[error("Request to {operation} failed: {source}")]
    Request {
        /// Which account operation was attempted.
        operation: &'static str,
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("Backend rejected {operation} with status {status}")]
    Rejected {
        /// Which account operation was attempted.
        operation: &'static str,
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// The backend answered with a body that does not match the contract.
    #[error("Unexpected response to {operation}: {message}")]
    Decode {
        /// Which account operation was attempted.
        operation: &'static str,
        /// Description of the decoding failure.
        message: String,
    },

    /// The operation needs a live access token and there is none.
    #[error("Not signed in\n\nSuggestion: Run `lumina login` first")]
    NotAuthenticated,

    // ========================================================================
    // Credential Store Errors
    // ========================================================================
    /// The credentials file could not be read or written.
    #[error("Credentials file '{path}': {message}")]
    CredentialsFile {
        /// Path to the credentials file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Request` error.
    #[must_use]
    pub const fn request(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Request { operation, source }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            operation,
            message: message.into(),
        }
    }

    /// Creates a new `CredentialsFile` error.
    #[must_use]
    pub fn credentials_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CredentialsFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the same call may succeed.
    ///
    /// Transport failures, server errors and rate limiting are transient;
    /// rejected credentials and malformed responses are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Decode { .. } | Self::NotAuthenticated | Self::CredentialsFile { .. } => false,
        }
    }
}
