//! Documents as seen by the extraction pipeline

use serde::{Deserialize, Serialize};

/// Format metadata captured when a document's text was extracted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File size in bytes
    pub size_bytes: u64,

    /// Page or slide count, when the source format exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,

    /// Source format tag (e.g., "txt", "pdf")
    #[serde(default)]
    pub format: String,
}

/// A document owned by the pipeline for the duration of one extraction run
///
/// Immutable once the text has been extracted.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier, usually the file name
    pub id: String,

    /// Raw extracted text
    pub text: String,

    /// Format metadata
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document from an identifier and extracted text
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}
