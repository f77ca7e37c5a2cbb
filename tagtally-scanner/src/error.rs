use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

/// Everything that can go wrong while producing a single [`crate::FetchResult`].
///
/// None of these abort a batch. They are folded into the result for the URL
/// they belong to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Response body exceeded {0} bytes and was truncated")]
    BodyTooLarge(usize),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Batch deadline expired before the fetch completed")]
    TimedOut,

    #[error("Batch was cancelled before the fetch completed")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Stable, machine readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Connect(_) => "connect",
            FetchError::Timeout(_) => "timeout",
            FetchError::Status(_) => "status",
            FetchError::Body(_) => "body",
            FetchError::BodyTooLarge(_) => "body_too_large",
            FetchError::Request(_) => "request",
            FetchError::TimedOut => "timed_out",
            FetchError::Cancelled => "cancelled",
            FetchError::Internal(_) => "internal",
        }
    }

    /// True when no HTTP response was ever received for the URL.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidUrl(_)
                | FetchError::Connect(_)
                | FetchError::Timeout(_)
                | FetchError::Request(_)
                | FetchError::TimedOut
                | FetchError::Cancelled
                | FetchError::Internal(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FetchError::Body(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FetchError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
