//! Structured error types for the client.
//!
//! `ClientError` is `Clone` on purpose: a deduplicated in-flight result fans
//! the same failure out to every waiter, so the error must be shareable.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request cancelled: {url}")]
    Cancelled { url: String },
}

impl ClientError {
    /// Whether a retry at the caller's level could plausibly succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Network { .. } => true,
            ClientError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ClientError::Config(_) | ClientError::Parse(_) | ClientError::Cancelled { .. } => false,
        }
    }
}
