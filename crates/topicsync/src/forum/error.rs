//! Error types for forum API operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the Discourse API.
#[derive(Debug, Error)]
pub enum ForumError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Still throttled after every retry was spent.
    #[error("Rate limit exceeded. Retry after {retry_at}")]
    RateLimited { retry_at: DateTime<Utc> },

    /// API key rejected or lacking permission.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
