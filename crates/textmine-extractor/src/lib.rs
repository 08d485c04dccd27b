//! TextMine Extractor
//!
//! Converts unstructured text to structured records using an LLM.
//!
//! # Overview
//!
//! The extractor is the core of the pipeline: it splits documents into
//! overlapping chunks, builds a prompt for every chunk-category pair, sends
//! the prompts to a model backend, parses the responses into records, and
//! merges the per-chunk results into one deduplicated result per document.
//!
//! # Architecture
//!
//! ```text
//! Document → Chunker → PromptLibrary → ModelBackend → Parser → Merger → ExtractionResult
//! ```
//!
//! # Key Features
//!
//! - **Overlapping Chunking**: Fixed windows with configurable overlap so
//!   facts spanning a boundary appear whole in at least one chunk
//! - **Per-Category Prompts**: One call per chunk-category pair, with
//!   customizable templates
//! - **Lenient Parsing**: Malformed model output is repaired line by line
//!   instead of failing the chunk
//! - **Order-Independent Merging**: Results are identical no matter which
//!   chunk's call completes first
//! - **Graceful Degradation**: A failed call degrades one chunk-category
//!   pair; the rest of the run proceeds
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use textmine_extractor::{Extractor, PipelineConfig, PromptLibrary};
//! use textmine_llm::MockBackend;
//! use textmine_schema::{Category, Document, DocumentMetadata, Field, SchemaRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::from_categories(vec![Category::new(
//!     "products",
//!     "Products mentioned in the text",
//!     vec![Field::new("name", "Product name")],
//! )])?;
//!
//! let backend = Arc::new(MockBackend::new(r#"[{"name": "ProductX"}]"#));
//! let extractor = Extractor::new(
//!     backend,
//!     registry,
//!     PromptLibrary::default(),
//!     PipelineConfig::default(),
//! )?;
//!
//! let documents = vec![Document::new(
//!     "notes.txt",
//!     "ProductX is a CRM tool.",
//!     DocumentMetadata::default(),
//! )];
//! let output = extractor.run(documents).await?;
//! println!("{} documents processed", output.documents.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunker;
mod config;
mod error;
mod merge;
mod parser;
mod pipeline;
mod prompt;
mod source;


pub use chunker::{chunk_text, Chunk};
pub use config::PipelineConfig;
pub use error::{DocumentReadError, ExtractorError};
pub use merge::DocumentMerger;
pub use parser::{parse_response, ParseOutcome};
pub use pipeline::Extractor;
pub use prompt::{PromptLibrary, DEFAULT_PERSONA};
pub use source::{load_document, DocumentSource, PlainTextSource};
