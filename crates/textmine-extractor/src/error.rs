//! Error types for the extraction pipeline

use textmine_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while running the extraction pipeline
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Invalid pipeline configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A prompt template is missing a required placeholder
    #[error("template for category '{category}' is missing the '{{{placeholder}}}' placeholder")]
    Template {
        /// Category whose template failed validation
        category: String,
        /// The missing placeholder name
        placeholder: String,
    },

    /// Model backend error that escaped the retry loop
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Consecutive call failures with no success: the backend is unusable
    #[error("no usable backend: {consecutive} consecutive calls failed without a single success")]
    NoUsableBackend {
        /// Number of consecutive failures observed
        consecutive: usize,
    },

    /// A worker task panicked or was aborted
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Errors raised while reading a document's text
///
/// Always per-document: the caller logs, skips the document, and continues.
#[derive(Debug, Error)]
pub enum DocumentReadError {
    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File exceeds the configured size limit
    #[error("file '{path}' is {size_mb} MB, above the {limit_mb} MB limit")]
    TooLarge {
        /// Offending file path
        path: String,
        /// Observed size in megabytes
        size_mb: u64,
        /// Configured limit in megabytes
        limit_mb: u64,
    },

    /// The file extension is not handled by any document source
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}
