//! CLI command definitions and argument parsing.

use crate::config::BackendKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TextMine - Extract structured information from documents using an LLM.
#[derive(Debug, Parser)]
#[command(name = "textmine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run extraction over a directory of documents
    Extract(ExtractArgs),

    /// Check which backends and models are reachable
    CheckModels(CheckModelsArgs),

    /// Write a starter configuration file
    Init(InitArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Directory containing documents to process
    #[arg(long, default_value = "docs")]
    pub docs_dir: PathBuf,

    /// Prompts file overriding the built-in persona and templates
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Backend to use, overriding the configured default
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Output file path, overriding the configured one
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the check-models command.
#[derive(Debug, Parser)]
pub struct CheckModelsArgs {
    /// Only check this backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

/// Arguments for the init command.
#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Where to write the starter configuration
    #[arg(default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_defaults() {
        let cli = Cli::parse_from(["textmine", "extract"]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.docs_dir, PathBuf::from("docs"));
                assert!(args.backend.is_none());
                assert!(args.output.is_none());
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_backend_override_parses() {
        let cli = Cli::parse_from(["textmine", "extract", "--backend", "openai"]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.backend, Some(BackendKind::Openai));
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["textmine", "-v", "-c", "custom.toml", "check-models"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
