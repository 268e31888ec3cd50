//! LLM Error Types
//!
//! Defines error types for provider adapter calls.

/// Errors that can occur during a provider call
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("HTTP request failed: {0}")]
    HttpError(reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LLMError::Timeout
        } else {
            LLMError::HttpError(err)
        }
    }
}

impl LLMError {
    /// Map a non-success HTTP status and body to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => LLMError::AuthError(message),
            _ => LLMError::ApiError { status, message },
        }
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, LLMError>;
