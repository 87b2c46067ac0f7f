//! Error types for the Clinidraft domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; callers convert at their
//! own boundary (the pipeline into `RejectionReason`, the CLI into
//! `Box<dyn Error>`).

use serde::Serialize;
use thiserror::Error;

// --- Bounded context errors ---

/// Failures of the language-model capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned an empty completion: {0}")]
    EmptyCompletion(String),
}

impl ProviderError {
    /// Whether the failure was a deadline rather than a transport/auth error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }
}

/// Failures of a biomedical source backend.
///
/// These never fail a request; the pipeline degrades to an empty source list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("Source '{backend}' unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Source '{backend}' timed out after {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },
}

/// A malformed request, surfaced before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("'{field}' is {actual} characters long, maximum is {max}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("word_count {value} is outside the allowed range {min}-{max}")]
    WordCountOutOfRange { value: u32, min: u32, max: u32 },
}
