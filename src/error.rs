//! Error types for the Lark bot runtime
//!
//! This module provides the error type hierarchy using `thiserror` for
//! proper error handling across all components.

use thiserror::Error;

/// The main error type for Lark bot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Token acquisition/refresh errors
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Non-zero response code from the platform
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Webhook ingestion errors
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A scheduled operation was cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External token store errors
    #[error("Token store error: {0}")]
    Store(String),

    /// Generic error with message
    #[error("{0}")]
    Internal(String),
}

/// Token issuance and refresh errors
///
/// Fatal to any call needing auth until the caller retries; this crate never
/// retries internally.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The token endpoint answered with a non-zero code
    #[error("Token endpoint returned code {code}: {msg}")]
    Issuance {
        /// Upstream response code
        code: i64,
        /// Upstream error message
        msg: String,
    },

    /// The token endpoint could not be reached
    #[error("Token endpoint unreachable: {0}")]
    Transport(String),

    /// The token response did not carry the expected fields
    #[error("Malformed token response: {0}")]
    Malformed(String),
}

/// Non-zero `code` in a platform response envelope
///
/// Recoverable; the caller decides whether to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("code {code}: {msg}")]
pub struct PlatformError {
    /// Platform response code (0 means success)
    pub code: i64,
    /// Platform error message
    pub msg: String,
}

/// Webhook ingestion errors
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Request signature did not verify; the request is rejected
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// Ciphertext could not be decrypted; the request is rejected
    #[error("Payload decryption failed: {0}")]
    Decryption(String),

    /// A registered event type failed typed parsing; logged, never fails
    /// the request
    #[error("Event validation failed: {0}")]
    Validation(String),

    /// The request body is not a recognizable event
    #[error("Malformed event: {0}")]
    Malformed(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `LARK_APP_ID` not set
    #[error("LARK_APP_ID environment variable not set")]
    MissingAppId,

    /// `LARK_APP_SECRET` not set
    #[error("LARK_APP_SECRET environment variable not set")]
    MissingAppSecret,

    /// Base URL failed to parse
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Refresh margin failed to parse
    #[error("Invalid token refresh margin: {0}")]
    InvalidRefreshMargin(String),
}

/// Result type alias for Lark bot operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a generic error from a string
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// True when this error is the cancellation sentinel
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
