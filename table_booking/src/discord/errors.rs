//! Discord client error types.

use thiserror::Error;

/// Errors that can occur when talking to the Discord API
#[derive(Debug, Error)]
pub enum DiscordError {
    /// Message sent without a target channel
    #[error("channel ID cannot be empty")]
    EmptyChannel,

    /// HTTP client could not be built
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// API returned a non-success status
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
}

/// Result type for Discord operations
pub type DiscordResult<T> = Result<T, DiscordError>;
