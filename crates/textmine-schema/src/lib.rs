//! textmine Schema Layer
//!
//! This crate contains the data model shared by the extraction pipeline:
//! the extraction schema (categories and their fields), extracted records,
//! per-document results, and the aggregate run output.
//!
//! ## Key Concepts
//!
//! - **Category**: a named kind of information to extract, with a description
//!   and an ordered field list
//! - **Record**: one extracted instance of a category's fields from one chunk,
//!   tagged with provenance (document id, chunk index)
//! - **ExtractionResult**: the finalized, deduplicated per-document extraction
//! - **AggregateOutput**: the persisted artifact mapping document id to result,
//!   plus run-level metadata
//!
//! The schema is loaded once at startup, validated, and shared read-only
//! across all documents and chunks for the duration of a run.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod document;
pub mod record;
pub mod registry;
pub mod result;

// Re-exports for convenience
pub use category::{Category, Field};
pub use document::{Document, DocumentMetadata};
pub use record::{Provenance, Record};
pub use registry::{SchemaError, SchemaRegistry};
pub use result::{AggregateOutput, DegradedEntry, ExtractionResult, RunMetadata};
