//! Error types for the Lumina busy-state coordinator.
//!
//! The store and hook operations are total and never fail. Errors only come
//! from the edges around them: configuration loading, overlay mounting and the
//! remote overlay server.

use std::path::PathBuf;

/// A specialized `Result` type for Lumina core operations.
pub type Result<T> = std::result::Result<T, LuminaError>;

/// Errors that can occur around the busy-state coordinator.
///
/// Variants carry an actionable suggestion where one exists.
#[derive(Debug, thiserror::Error)]
pub enum LuminaError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your lumina.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Overlay Errors
    // ========================================================================
    /// A second overlay was mounted on a store that already has one.
    #[error("An overlay is already mounted for this busy store\n\nSuggestion: Mount the overlay once at the application root and share the store handle")]
    OverlayAlreadyMounted,

    // ========================================================================
    // Server Errors
    // ========================================================================
    /// The remote overlay server could not bind its listener.
    #[error("Failed to bind overlay server to {addr}: {message}\n\nSuggestion: Try a different port with --port")]
    ServerBind {
        /// The address that was requested.
        addr: String,
        /// Description of the bind failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `ServerBind` error.
    #[must_use]
    pub fn server_bind(addr: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::ServerBind {
            addr: addr.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error should stop the process at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::ServerBind { .. }
        )
    }
}
