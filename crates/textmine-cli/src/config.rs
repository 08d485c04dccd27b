//! Configuration management for the CLI.
//!
//! One TOML file describes the whole run: chunking and processing knobs,
//! backend connection details, and the extraction schema itself. The schema
//! section is converted into a validated [`SchemaRegistry`] before the
//! pipeline starts.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use textmine_extractor::PipelineConfig;
use textmine_llm::{OllamaConfig, OpenAiConfig};
use textmine_schema::{Category, Field, SchemaRegistry};

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "textmine.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chunking and output settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// File handling and concurrency settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Backend selection and connection details
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Extraction schema: category name to its definition
    #[serde(default)]
    pub schema: BTreeMap<String, CategoryConfig>,
}

/// Chunking and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Chunk window size in bytes, clamped to character boundaries
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks (bytes)
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Minimum chunk length after trimming
    #[serde(default = "default_min_chunk_length")]
    pub min_chunk_length: usize,

    /// Where the aggregate JSON output is written
    #[serde(default = "default_output_file")]
    pub output_file: String,
}

/// File handling and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Files larger than this are skipped
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Bound on concurrent model calls per document
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Attempts (including the first) per chunk-category call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry backoff in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Consecutive initial failures that abort the run
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: usize,
}

/// Backend selection and per-backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Which backend to use when `--backend` is not given
    #[serde(default = "default_backend")]
    pub default: BackendKind,

    /// Ollama connection settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI connection settings
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible HTTP API
    Openai,
}

/// One category in the `[schema]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// What this category captures, embedded into prompts
    pub description: String,

    /// Ordered field definitions; the first field is the dedup key
    pub fields: Vec<Field>,
}

impl Config {
    /// Load configuration from a file, or defaults when `path` is `None`
    /// and no file exists at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Build the validated schema registry from the `[schema]` section.
    pub fn schema_registry(&self) -> Result<SchemaRegistry> {
        let categories = self
            .schema
            .iter()
            .map(|(name, def)| Category::new(name, &def.description, def.fields.clone()))
            .collect();
        Ok(SchemaRegistry::from_categories(categories)?)
    }

    /// Pipeline configuration assembled from the general and processing
    /// sections.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_size: self.general.chunk_size,
            overlap: self.general.overlap,
            min_chunk_length: self.general.min_chunk_length,
            max_workers: self.processing.max_workers,
            max_retries: self.processing.max_retries,
            retry_base_delay_ms: self.processing.retry_base_delay_ms,
            failure_threshold: self.processing.failure_threshold,
        }
    }

    /// A starter configuration file with one example category.
    pub fn starter_toml() -> String {
        let mut config = Config::default();
        config.schema.insert(
            "products".to_string(),
            CategoryConfig {
                description: "Products or services mentioned in the documents".to_string(),
                fields: vec![
                    Field::new("name", "Product or service name"),
                    Field::new("description", "What it does"),
                ],
            },
        );
        // Defaults always serialize cleanly.
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            min_chunk_length: default_min_chunk_length(),
            output_file: default_output_file(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_workers: default_max_workers(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            default: default_backend(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    2000
}

fn default_overlap() -> usize {
    200
}

fn default_min_chunk_length() -> usize {
    50
}

fn default_output_file() -> String {
    "output/extracted_data.json".to_string()
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_max_workers() -> usize {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_failure_threshold() -> usize {
    5
}

fn default_backend() -> BackendKind {
    BackendKind::Ollama
}
