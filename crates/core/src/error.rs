//! Error types for request validation.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("uri parameter is missing")]
    MissingUri,

    #[error("uri is too long: {len} bytes (max {max})")]
    UriTooLong { len: usize, max: usize },

    #[error("uri is not an allowed certification authority resource: {0}")]
    UriRejected(String),

    #[error("unsupported API version: {0}")]
    UnsupportedApiVersion(String),

    #[error("invalid update type: {0}")]
    InvalidUpdateType(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error was caused by the content of an inbound request.
    pub fn is_invalid_request(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
