//! Document discovery.
//!
//! Walks the documents directory, loads every file a registered source
//! handles, and records the rest as skipped. Discovery order is sorted by
//! path so runs over the same tree are deterministic.

use crate::error::{CliError, Result};
use std::path::Path;
use textmine_extractor::{load_document, DocumentSource, PlainTextSource};
use textmine_schema::Document;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of scanning a documents directory.
#[derive(Debug)]
pub struct Discovery {
    /// Documents loaded, in sorted path order
    pub documents: Vec<Document>,

    /// Paths that were skipped, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Scan `docs_dir` and load every supported document.
///
/// Unsupported and oversized files are skipped with a warning; an unreadable
/// file is skipped the same way rather than failing the run.
pub fn discover_documents(docs_dir: &Path, max_file_size_mb: u64) -> Result<Discovery> {
    if !docs_dir.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "documents directory not found: {}",
            docs_dir.display()
        )));
    }

    let source = PlainTextSource::new(max_file_size_mb);

    let mut paths = Vec::new();
    for entry in WalkDir::new(docs_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            CliError::InvalidInput(format!("cannot walk {}: {}", docs_dir.display(), e))
        })?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        match load_document(&source, &path) {
            Ok(document) => {
                info!(
                    document = %document.id,
                    bytes = document.metadata.size_bytes,
                    "loaded document"
                );
                documents.push(document);
            }
            Err(error) => {
                warn!("skipping {}: {}", path.display(), error);
                skipped.push((path.display().to_string(), error.to_string()));
            }
        }
    }

    info!(
        loaded = documents.len(),
        skipped = skipped.len(),
        "document discovery complete"
    );
    Ok(Discovery { documents, skipped })
}
