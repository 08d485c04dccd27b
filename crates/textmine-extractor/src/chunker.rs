//! Overlapping fixed-window text chunking
//!
//! Windows of `chunk_size` bytes advance by `chunk_size - overlap`, so
//! consecutive chunks share up to `overlap` bytes. The sequence is
//! deterministic and covers the full text; window boundaries are clamped
//! upward to UTF-8 character boundaries, so a window never splits a
//! character.

use crate::config::PipelineConfig;
use crate::error::ExtractorError;

/// An overlapping substring window of a document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence index among a document's emitted chunks
    pub index: usize,

    /// Byte offset of the chunk within the document text
    pub start: usize,

    /// The chunk text
    pub text: String,
}

impl Chunk {
    /// Chunk length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the chunk text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Split `text` into overlapping chunks per the pipeline configuration
///
/// Chunks whose trimmed length falls below `min_chunk_length` are dropped as
/// noise (trailing whitespace, page footers); this is policy, not an error.
/// Fails with a configuration error when `overlap >= chunk_size`.
pub fn chunk_text(text: &str, config: &PipelineConfig) -> Result<Vec<Chunk>, ExtractorError> {
    if config.chunk_size == 0 {
        return Err(ExtractorError::Config(
            "chunk_size must be greater than 0".to_string(),
        ));
    }
    if config.overlap >= config.chunk_size {
        return Err(ExtractorError::Config(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            config.overlap, config.chunk_size
        )));
    }

    let stride = config.chunk_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;

    while start < text.len() {
        let end = ceil_char_boundary(text, (start + config.chunk_size).min(text.len()));
        let window = &text[start..end];

        if window.trim().len() >= config.min_chunk_length {
            chunks.push(Chunk {
                index,
                start,
                text: window.to_string(),
            });
            index += 1;
        }

        if end == text.len() {
            break;
        }
        start = ceil_char_boundary(text, start + stride);
    }

    Ok(chunks)
}

/// Smallest char boundary at or above `index` (clamped to the text length)
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
