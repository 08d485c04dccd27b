//! Document text sources
//!
//! Raw text extraction from files is an external collaborator: the pipeline
//! only sees the [`DocumentSource`] trait. Plain text files are supported
//! here; PDF/DOCX/image OCR implementations plug in behind the same trait.

use crate::error::DocumentReadError;
use std::fs;
use std::path::Path;
use textmine_schema::{Document, DocumentMetadata};

/// Extracts text and metadata from document files
pub trait DocumentSource: Send + Sync {
    /// File extensions (lowercase, without dot) this source handles
    fn extensions(&self) -> &[&str];

    /// Extract the document's text
    fn extract_text(&self, path: &Path) -> Result<String, DocumentReadError>;

    /// Extract format metadata
    fn extract_metadata(&self, path: &Path) -> Result<DocumentMetadata, DocumentReadError>;

    /// Whether this source handles the given path, judged by extension
    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| self.extensions().contains(&e.as_str()))
    }
}

/// Source for plain text and markdown files
pub struct PlainTextSource {
    max_file_size_mb: u64,
}

impl PlainTextSource {
    /// Create a source with the given file size limit (megabytes)
    pub fn new(max_file_size_mb: u64) -> Self {
        Self { max_file_size_mb }
    }

    fn check_size(&self, path: &Path) -> Result<u64, DocumentReadError> {
        let size = fs::metadata(path)?.len();
        let size_mb = size / (1024 * 1024);
        if size_mb >= self.max_file_size_mb {
            return Err(DocumentReadError::TooLarge {
                path: path.display().to_string(),
                size_mb,
                limit_mb: self.max_file_size_mb,
            });
        }
        Ok(size)
    }
}

impl Default for PlainTextSource {
    fn default() -> Self {
        Self::new(100)
    }
}

impl DocumentSource for PlainTextSource {
    fn extensions(&self) -> &[&str] {
        &["txt", "md"]
    }

    fn extract_text(&self, path: &Path) -> Result<String, DocumentReadError> {
        self.check_size(path)?;
        let raw = fs::read_to_string(path)?;
        Ok(clean_text(&raw))
    }

    fn extract_metadata(&self, path: &Path) -> Result<DocumentMetadata, DocumentReadError> {
        let size_bytes = fs::metadata(path)?.len();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("txt")
            .to_lowercase();
        Ok(DocumentMetadata {
            size_bytes,
            page_count: None,
            format,
        })
    }
}

/// Normalize line endings and strip form feeds left by text extraction
pub fn clean_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{c}', " ")
        .trim_end()
        .to_string()
}

/// Load a document through a source
///
/// The document id is the file name; extraction failures are reported to the
/// caller, which logs, skips the document, and continues.
pub fn load_document(
    source: &dyn DocumentSource,
    path: &Path,
) -> Result<Document, DocumentReadError> {
    if !source.handles(path) {
        return Err(DocumentReadError::UnsupportedFormat(
            path.display().to_string(),
        ));
    }
    let text = source.extract_text(path)?;
    let metadata = source.extract_metadata(path)?;
    let id = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();
    Ok(Document::new(id, text, metadata))
}
