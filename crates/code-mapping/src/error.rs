//! Error types for code mapping.

use thiserror::Error;

/// Raised when a backoff wait is cancelled before it elapsed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Retry interrupted")]
pub struct RetryInterrupted;

/// Errors that can occur while configuring, loading or querying code mappings.
#[derive(Error, Debug)]
pub enum CodeMappingError {
    /// Configuration rejected at construction time.
    #[error("Invalid code mapping configuration: {0}")]
    InvalidConfig(String),

    /// A single concept map could not be fetched from the remote source.
    #[error("Concept map {name} unavailable: {reason}")]
    SourceUnavailable {
        /// Name of the concept map.
        name: String,
        /// Why the fetch failed.
        reason: String,
    },

    /// A cache loader failed as a whole.
    #[error("Loading cache {cache} failed: {reason}")]
    Loader {
        /// Name of the cache being loaded.
        cache: String,
        /// Why loading failed.
        reason: String,
    },

    /// The backoff wait between two attempts was cancelled.
    #[error(transparent)]
    RetryInterrupted(#[from] RetryInterrupted),

    /// The cache for a category is still empty after a forced reload.
    #[error("Code mapping not available for category {category}")]
    MappingUnavailable {
        /// The category that has no mapping data.
        category: String,
    },

    /// Lookup against a category that was never configured.
    #[error("Unknown code mapping category: {0}")]
    UnknownCategory(String),
}

impl CodeMappingError {
    /// Creates a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates a source failure for the given concept map.
    pub fn source_unavailable(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for code mapping operations.
pub type CodeMappingResult<T> = std::result::Result<T, CodeMappingError>;
