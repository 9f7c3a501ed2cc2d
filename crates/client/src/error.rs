//! Dispatcher errors.

use serde_json::Value;
use thiserror::Error;

use crate::cache::CacheError;

/// Errors that can occur when dispatching to Klaviyo or the subscription router.
#[derive(Debug, Error)]
pub enum KlaviyoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to encode a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Tracking requires an identified customer; the event was queued.
    #[error("No customer identified")]
    NotIdentified,

    /// Client is offline; the event was queued.
    #[error("No connection")]
    Offline,

    /// Back-in-stock endpoint answered without `"success": true`.
    #[error("Request rejected: {0}")]
    Rejected(Value),

    /// Operation has no server-side counterpart.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Local cache failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl From<serde_json::Error> for KlaviyoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl KlaviyoError {
    /// Whether the failure left the event in the track queue for replay.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::NotIdentified | Self::Offline)
    }
}

/// Result type alias for `KlaviyoError`.
pub type Result<T> = std::result::Result<T, KlaviyoError>;
