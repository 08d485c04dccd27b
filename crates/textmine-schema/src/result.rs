//! Per-document results and the aggregate run artifact

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// The finalized, deduplicated extraction for one document
///
/// Built by the merge engine while a document's chunks are processed, then
/// finalized. Category keys are ordered for stable serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Category name to its ordered, deduplicated record sequence
    #[serde(flatten)]
    categories: BTreeMap<String, Vec<Record>>,
}

impl ExtractionResult {
    /// Create an empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the finalized record sequence for a category
    pub fn set_category(&mut self, category: impl Into<String>, records: Vec<Record>) {
        self.categories.insert(category.into(), records);
    }

    /// Records for a category, if any were produced
    pub fn records(&self, category: &str) -> Option<&[Record]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Iterate (category, records) pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.categories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total record count across all categories
    pub fn record_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// True when no category produced any record
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }
}

/// A chunk-category pair that exhausted its retries and contributed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedEntry {
    /// Document the failure occurred in
    pub document_id: String,

    /// Category being extracted when the calls failed
    pub category: String,

    /// Chunk index of the failed call
    pub chunk_index: usize,
}

/// Run-level metadata persisted alongside the per-document results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique run identifier
    pub run_id: String,

    /// Unix timestamp (seconds) when the run started
    pub timestamp: u64,

    /// Model identifier used for the run
    pub model: String,

    /// Documents submitted to the pipeline
    pub total_documents: usize,

    /// Documents skipped because their text could not be extracted
    pub skipped_documents: Vec<String>,

    /// Chunk-category pairs that failed all retries
    pub degraded: Vec<DegradedEntry>,

    /// Lines dropped by the response repairer across the run
    pub discarded_lines: usize,
}

impl RunMetadata {
    /// Create metadata for a run starting now
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            model: model.into(),
            total_documents: 0,
            skipped_documents: Vec::new(),
            degraded: Vec::new(),
            discarded_lines: 0,
        }
    }
}

/// The externally persisted artifact for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOutput {
    /// Run-level metadata
    pub metadata: RunMetadata,

    /// Document identifier to its extraction result, key-ordered
    pub documents: BTreeMap<String, ExtractionResult>,
}

impl AggregateOutput {
    /// Create an empty aggregate for a run
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            documents: BTreeMap::new(),
        }
    }

    /// Accumulate one document's finalized result
    ///
    /// Documents are independent; no cross-document deduplication happens.
    pub fn add_document(&mut self, document_id: impl Into<String>, result: ExtractionResult) {
        self.documents.insert(document_id.into(), result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(name: &str) -> Record {
        let mut r = Record::new("doc", 0);
        r.set("name", Some(name));
        r
    }

    #[test]
    fn test_result_accumulation() {
        let mut result = ExtractionResult::new();
        result.set_category("products", vec![record_with("ProductX")]);
        result.set_category("integrations", vec![]);

        assert_eq!(result.record_count(), 1);
        assert!(!result.is_empty());
        assert_eq!(result.records("products").unwrap().len(), 1);
        assert!(result.records("absent").is_none());
    }

    #[test]
    fn test_empty_result() {
        let mut result = ExtractionResult::new();
        result.set_category("products", vec![]);
        assert!(result.is_empty());
        assert_eq!(result.record_count(), 0);
    }

    #[test]
    fn test_aggregate_keeps_documents_independent() {
        let mut aggregate = AggregateOutput::new(RunMetadata::new("llama3.2"));

        let mut a = ExtractionResult::new();
        a.set_category("products", vec![record_with("ProductX")]);
        let mut b = ExtractionResult::new();
        b.set_category("products", vec![record_with("ProductX")]);

        aggregate.add_document("a.txt", a);
        aggregate.add_document("b.txt", b);

        // Same record in two documents stays in both.
        assert_eq!(aggregate.documents.len(), 2);
        assert_eq!(aggregate.documents["a.txt"].record_count(), 1);
        assert_eq!(aggregate.documents["b.txt"].record_count(), 1);
    }

    #[test]
    fn test_serialization_is_key_ordered() {
        let mut aggregate = AggregateOutput::new(RunMetadata::new("llama3.2"));
        aggregate.add_document("zeta.txt", ExtractionResult::new());
        aggregate.add_document("alpha.txt", ExtractionResult::new());

        let json = serde_json::to_string(&aggregate).unwrap();
        let alpha = json.find("alpha.txt").unwrap();
        let zeta = json.find("zeta.txt").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn test_run_metadata_defaults() {
        let meta = RunMetadata::new("gpt-4o-mini");
        assert_eq!(meta.model, "gpt-4o-mini");
        assert_eq!(meta.total_documents, 0);
        assert!(meta.degraded.is_empty());
        assert!(meta.timestamp > 0);
        assert_eq!(meta.run_id.len(), 36);
    }
}
