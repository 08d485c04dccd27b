//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema definition error
    #[error("Schema error: {0}")]
    Schema(#[from] textmine_schema::SchemaError),

    /// Pipeline error
    #[error("Extraction error: {0}")]
    Extractor(#[from] textmine_extractor::ExtractorError),

    /// Backend error outside the pipeline (e.g. model availability check)
    #[error("Backend error: {0}")]
    Llm(#[from] textmine_llm::LlmError),

    /// Document could not be read
    #[error("Document error: {0}")]
    Document(#[from] textmine_extractor::DocumentReadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
