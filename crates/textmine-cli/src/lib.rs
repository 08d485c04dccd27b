//! TextMine CLI library.
//!
//! This library provides the core functionality for the TextMine command-line
//! interface: configuration loading, document discovery, command execution,
//! and output writing.

pub mod cli;
pub mod commands;
pub mod config;
pub mod discover;
pub mod error;
pub mod output;
pub mod prompts;

pub use cli::{Cli, Command};
pub use config::{BackendKind, Config};
pub use error::{CliError, Result};
