//! Error Handling Module
//!
//! A single error type is shared by the backend client, the structured
//! requestor and the session. Every variant falls into one of the coarse
//! categories below; the session only ever logs them, a failure never leaves
//! the stream that produced it.
//!
//! # Example
//!
//! ```rust
//! use hn_stream::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::api_error(503, "overloaded");
//! assert_eq!(error.category(), ErrorCategory::BackendUnavailable);
//! assert!(error.is_retryable());
//! ```

use thiserror::Error;

/// Coarse error classes used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The completion backend could not be reached or answered with a server error.
    BackendUnavailable,
    /// The backend answered, but its output did not conform to the declared schema.
    SchemaValidation,
    /// The request itself was wrong (bad credentials, bad configuration, bad input).
    Client,
    /// A bug or broken invariant inside this crate.
    Internal,
}

/// Errors produced while requesting, streaming and decoding completions.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Transport failure reaching the backend (connect, TLS, timeout, dropped body)
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Non-success HTTP status returned by the backend
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The SSE framing of a response could not be decoded
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Model output could not be coerced into the declared schema
    #[error("Schema validation failed: {0}")]
    SchemaValidationFailure(String),

    /// Backend payload (an SSE chunk) could not be understood
    #[error("Parse error: {0}")]
    ParseError(String),

    /// serde_json failure while building or converting our own values
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid environment or builder configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invalid caller input (empty prompt, malformed schema)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Map the error onto its coarse category.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BackendUnavailable(_) | Self::StreamError(_) | Self::ParseError(_) => {
                ErrorCategory::BackendUnavailable
            }
            Self::ApiError { code, .. } => match *code {
                408 | 429 | 500..=599 => ErrorCategory::BackendUnavailable,
                _ => ErrorCategory::Client,
            },
            Self::SchemaValidationFailure(_) => ErrorCategory::SchemaValidation,
            Self::ConfigurationError(_) | Self::InvalidInput(_) => ErrorCategory::Client,
            Self::JsonError(_) | Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Whether issuing the same request again may succeed.
    ///
    /// Schema failures count as retryable: a fresh sample from the model is the
    /// only correction mechanism available.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::BackendUnavailable | ErrorCategory::SchemaValidation
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
