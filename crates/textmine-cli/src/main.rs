//! TextMine CLI - Extract structured information from documents using an LLM.

use clap::Parser;
use textmine_cli::commands;
use textmine_cli::{Cli, Command, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> textmine_cli::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for command output.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Command::Extract(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::execute_extract(args, config).await
        }
        Command::CheckModels(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::execute_check_models(args, config).await
        }
        Command::Init(args) => commands::execute_init(args),
    }
}
