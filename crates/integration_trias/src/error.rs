//! TRIAS client error types

use thiserror::Error;

use crate::decoder::DecodeError;

/// Errors returned by [`crate::TriasClient`] implementations
#[derive(Debug, Error)]
pub enum TriasError {
    /// Connection to the TRIAS service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP request to the TRIAS service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The service delivered a response with `siri:Status` false
    #[error("Service rejected the request (producer {producer})")]
    ServiceRejected {
        /// `siri:ProducerRef` of the rejecting service
        producer: String,
    },

    /// The endpoint answered HTTP 429
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimitExceeded {
        /// Value of the `Retry-After` header, when it is a number of seconds
        retry_after_secs: Option<u64>,
    },

    /// A request names a location the service cannot be asked about
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// The endpoint answered with a 5xx status
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// [`crate::TriasConfig`] failed validation
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// No response within the configured timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// `timeout_secs` from the configuration
        timeout_secs: u64,
    },
}

impl TriasError {
    /// Whether the same request may succeed when sent again later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::ServiceUnavailable(_)
                | Self::Timeout { .. }
                | Self::RateLimitExceeded { .. }
        )
    }
}
