/*!
 * Error types for the cuebatch library.
 *
 * This module contains custom error types for different parts of the
 * orchestration pipeline, using the thiserror crate for ergonomic error
 * definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling a translation back-end
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The back-end was asked for a native batch call it does not implement
    #[error("Provider '{0}' does not support native batch translation")]
    BatchUnsupported(String),
}

/// Errors that can occur when looking up provider capabilities
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The provider id is not present in the capability registry.
    /// This is a caller configuration bug and is never retried.
    #[error("Unknown translation provider: {0}")]
    UnknownProvider(String),
}

/// Rejections produced by the per-provider rate limiter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateLimitError {
    /// The sliding-window request limit is exhausted
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded {
        /// How long the caller must wait before re-attempting
        retry_after: Duration,
    },

    /// The short burst sub-window cap was hit
    #[error("Burst limit exceeded, retry after {retry_after:?}")]
    BurstLimitExceeded {
        /// Remaining time in the burst sub-window
        retry_after: Duration,
    },
}

impl RateLimitError {
    /// The wait the limiter asks for before the next attempt
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::RateLimitExceeded { retry_after } => *retry_after,
            Self::BurstLimitExceeded { retry_after } => *retry_after,
        }
    }
}

/// Errors that can occur during translation orchestration
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Unknown provider id (configuration defect, surfaces unmodified)
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Rate limiter rejection; direct callers must wait and re-attempt
    #[error("Rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),

    /// Error from the back-end API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TranslationError {
    /// Whether the error indicates a caller configuration bug rather
    /// than a transient condition
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Registry(_))
    }
}
