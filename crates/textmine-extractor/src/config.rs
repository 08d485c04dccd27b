//! Configuration for the extraction pipeline

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use textmine_llm::RetryPolicy;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunk window size in bytes, clamped to character boundaries
    pub chunk_size: usize,

    /// Overlap carried between consecutive chunks (bytes)
    pub overlap: usize,

    /// Chunks shorter than this after trimming are dropped as noise
    pub min_chunk_length: usize,

    /// Bound on concurrent model calls per document
    pub max_workers: usize,

    /// Attempts (including the first) per chunk-category call
    pub max_retries: u32,

    /// Base retry backoff in milliseconds; doubles per attempt
    pub retry_base_delay_ms: u64,

    /// Consecutive initial failures that escalate to a fatal abort
    pub failure_threshold: usize,
}

impl Default for PipelineConfig {
    /// Defaults matching a moderate local-model setup
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            overlap: 200,
            min_chunk_length: 50,
            max_workers: 2,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            failure_threshold: 5,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.chunk_size == 0 {
            return Err(ExtractorError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(ExtractorError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if self.min_chunk_length > self.chunk_size {
            return Err(ExtractorError::Config(format!(
                "min_chunk_length ({}) cannot exceed chunk_size ({})",
                self.min_chunk_length, self.chunk_size
            )));
        }
        if self.max_workers == 0 {
            return Err(ExtractorError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(ExtractorError::Config(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(ExtractorError::Config(
                "failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("failed to serialize to TOML: {}", e)))
    }
}
