//! Command execution.

use crate::cli::{CheckModelsArgs, ExtractArgs, InitArgs};
use crate::config::{BackendKind, Config};
use crate::discover::discover_documents;
use crate::error::{CliError, Result};
use crate::output::{print_summary, write_output};
use crate::prompts::PromptsFile;
use std::path::PathBuf;
use std::sync::Arc;
use textmine_extractor::Extractor;
use textmine_llm::{ModelBackend, OllamaBackend, OpenAiBackend};
use tracing::{info, warn};

fn build_backend(kind: BackendKind, config: &Config) -> Result<Arc<dyn ModelBackend>> {
    match kind {
        BackendKind::Ollama => Ok(Arc::new(OllamaBackend::new(config.backends.ollama.clone())?)),
        BackendKind::Openai => Ok(Arc::new(OpenAiBackend::new(config.backends.openai.clone())?)),
    }
}

/// Whether `model` appears in a backend's served-model listing
///
/// Ollama tags carry a variant suffix (`llama3.2:latest`), so a bare
/// configured name matches its tagged form.
fn model_is_served(model: &str, served: &[String]) -> bool {
    served
        .iter()
        .any(|m| m == model || m.split(':').next() == Some(model))
}

/// Pre-flight capability check: is the configured model in the backend's
/// listing? `None` when the listing itself is unavailable.
async fn model_reported(backend: &dyn ModelBackend) -> Option<bool> {
    match backend.list_models().await {
        Ok(models) => Some(model_is_served(backend.model(), &models)),
        Err(error) => {
            warn!(
                backend = backend.name(),
                "model listing failed, skipping capability check: {}", error
            );
            None
        }
    }
}

/// Run extraction over a directory of documents.
pub async fn execute_extract(args: ExtractArgs, config: Config) -> Result<()> {
    if config.schema.is_empty() {
        return Err(CliError::Config(
            "no categories defined; add a [schema.<name>] section to the configuration".to_string(),
        ));
    }
    let registry = config.schema_registry()?;

    let prompts = PromptsFile::load(args.prompts.as_deref())?.into_library()?;

    let kind = args.backend.unwrap_or(config.backends.default);
    let backend = build_backend(kind, &config)?;
    info!(backend = backend.name(), model = backend.model(), "backend selected");

    if !backend.is_available().await {
        warn!(
            backend = backend.name(),
            "backend did not respond to the availability probe; proceeding anyway"
        );
    } else if model_reported(backend.as_ref()).await == Some(false) {
        warn!(
            backend = backend.name(),
            model = backend.model(),
            "configured model is not in the backend's model listing; calls may fail"
        );
    }

    let discovery = discover_documents(&args.docs_dir, config.processing.max_file_size_mb)?;
    if discovery.documents.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "no supported documents found in {}",
            args.docs_dir.display()
        )));
    }

    let extractor = Extractor::new(
        backend,
        registry,
        prompts,
        config.pipeline_config(),
    )?;

    // Ctrl-C stops new model calls; in-flight ones finish and partial
    // results are still written.
    let cancel = extractor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupt received, finishing in-flight calls...");
            cancel.cancel();
        }
    });

    let skipped: Vec<String> = discovery
        .skipped
        .iter()
        .map(|(path, _)| path.clone())
        .collect();

    let mut output = extractor.run(discovery.documents).await?;
    output.metadata.skipped_documents = skipped;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.general.output_file));
    write_output(&output_path, &output)?;

    print_summary(&output);
    println!("  Output:     {}", output_path.display());
    Ok(())
}

/// Probe each backend and list its models.
pub async fn execute_check_models(args: CheckModelsArgs, config: Config) -> Result<()> {
    let kinds = match args.backend {
        Some(kind) => vec![kind],
        None => vec![BackendKind::Ollama, BackendKind::Openai],
    };

    for kind in kinds {
        let backend = match build_backend(kind, &config) {
            Ok(backend) => backend,
            Err(error) => {
                println!("{:?}: not configured ({})", kind, error);
                continue;
            }
        };

        println!("{} ({})", backend.name(), backend.model());
        match backend.list_models().await {
            Ok(models) if models.is_empty() => println!("  reachable, no models reported"),
            Ok(models) => {
                for model in models {
                    println!("  {}", model);
                }
            }
            Err(error) => println!("  unavailable: {}", error),
        }
    }
    Ok(())
}

/// Write a starter configuration file.
pub fn execute_init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        )));
    }
    if let Some(parent) = args.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.path, Config::starter_toml())?;
    println!("wrote starter configuration to {}", args.path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use textmine_llm::MockBackend;

    #[test]
    fn test_model_listing_match() {
        let served = vec!["mistral:latest".to_string(), "llama3.2:latest".to_string()];
        assert!(model_is_served("llama3.2", &served));
        assert!(model_is_served("mistral:latest", &served));
        assert!(!model_is_served("gpt-4o-mini", &served));
        assert!(!model_is_served("llama", &served));
    }

    #[tokio::test]
    async fn test_model_check_consults_backend_listing() {
        // MockBackend lists exactly its own configured model.
        let backend = MockBackend::new("[]");
        assert_eq!(model_reported(&backend).await, Some(true));
    }

    #[tokio::test]
    async fn test_model_check_inconclusive_when_listing_fails() {
        let backend = MockBackend::unreachable();
        assert_eq!(model_reported(&backend).await, None);
    }

    #[test]
    fn test_init_writes_parseable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textmine.toml");
        execute_init(InitArgs {
            path: path.clone(),
            force: false,
        })
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.schema_registry().unwrap().len() > 0);
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("textmine.toml");
        std::fs::write(&path, "# existing").unwrap();

        let result = execute_init(InitArgs {
            path: path.clone(),
            force: false,
        });
        assert!(result.is_err());

        execute_init(InitArgs { path, force: true }).unwrap();
    }

    #[tokio::test]
    async fn test_extract_requires_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "some document text").unwrap();

        let args = ExtractArgs {
            docs_dir: dir.path().to_path_buf(),
            prompts: None,
            backend: None,
            output: None,
        };
        let result = execute_extract(args, Config::default()).await;
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
