//! Ordered merge and deduplication of per-chunk records
//!
//! One merger exists per document and is owned by that document's
//! orchestrating task, so there is a single writer. Batches may arrive in any
//! completion order; they are buffered by chunk index and replayed in
//! ascending order at finalization, which makes the final record order
//! independent of concurrent dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;
use textmine_schema::{ExtractionResult, Record, SchemaRegistry};
use tracing::warn;

/// Accumulates per-chunk, per-category records for one document
#[derive(Debug)]
pub struct DocumentMerger {
    document_id: String,
    registry: Arc<SchemaRegistry>,
    // chunk index -> batches arriving from that chunk
    pending: BTreeMap<usize, Vec<(String, Vec<Record>)>>,
}

impl DocumentMerger {
    /// Create a merger for one document
    pub fn new(document_id: impl Into<String>, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            document_id: document_id.into(),
            registry,
            pending: BTreeMap::new(),
        }
    }

    /// Buffer one chunk-category batch; arrival order does not matter
    pub fn insert(&mut self, chunk_index: usize, category: impl Into<String>, records: Vec<Record>) {
        self.pending
            .entry(chunk_index)
            .or_default()
            .push((category.into(), records));
    }

    /// Replay buffered batches in chunk order and produce the finalized,
    /// deduplicated result
    ///
    /// Within each category, records keep chunk-arrival order; a record that
    /// duplicates an earlier one (per the schema's equivalence rule) is
    /// dropped, keeping the first-seen record unchanged.
    pub fn finalize(self) -> ExtractionResult {
        let mut merged: BTreeMap<String, Vec<Record>> = self
            .registry
            .categories()
            .map(|c| (c.name.clone(), Vec::new()))
            .collect();

        for (_, batches) in self.pending {
            for (category_name, records) in batches {
                let Some(category) = self.registry.get(&category_name) else {
                    warn!(
                        document = %self.document_id,
                        category = %category_name,
                        "dropping batch for unknown category"
                    );
                    continue;
                };
                let existing = merged
                    .entry(category.name.clone())
                    .or_default();
                for record in records {
                    if record.is_empty() {
                        continue;
                    }
                    if existing
                        .iter()
                        .any(|kept| kept.is_duplicate_of(&record, category))
                    {
                        continue;
                    }
                    existing.push(record);
                }
            }
        }

        let mut result = ExtractionResult::new();
        for (category, records) in merged {
            result.set_category(category, records);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textmine_schema::{Category, Field};

    fn registry() -> Arc<SchemaRegistry> {
        Arc::new(
            SchemaRegistry::from_categories(vec![Category::new(
                "products",
                "Products mentioned",
                vec![
                    Field::new("name", "Product name"),
                    Field::new("description", "Short description"),
                ],
            )])
            .unwrap(),
        )
    }

    fn record(chunk: usize, name: &str, description: &str) -> Record {
        let mut r = Record::new("doc", chunk);
        r.set("name", Some(name));
        r.set("description", Some(description));
        r
    }

    #[test]
    fn test_dedup_keeps_first_seen() {
        let mut merger = DocumentMerger::new("doc", registry());
        merger.insert(0, "products", vec![record(0, "ProductX", "CRM tool")]);
        merger.insert(1, "products", vec![record(1, "productx", "duplicate mention")]);

        let result = merger.finalize();
        let records = result.records("products").unwrap();
        assert_eq!(records.len(), 1);
        // Earliest chunk wins; no value overwriting.
        assert_eq!(records[0].get("description"), Some("CRM tool"));
        assert_eq!(records[0].provenance().unwrap().chunk_index, 0);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let mut merger = DocumentMerger::new("doc", registry());
        let r = record(0, "ProductX", "CRM tool");
        merger.insert(0, "products", vec![r.clone()]);
        merger.insert(0, "products", vec![r]);

        let result = merger.finalize();
        assert_eq!(result.records("products").unwrap().len(), 1);
    }

    #[test]
    fn test_out_of_order_arrival_matches_in_order() {
        let batches = [
            (0usize, record(0, "Alpha", "first")),
            (1, record(1, "Beta", "second")),
            (2, record(2, "Gamma", "third")),
        ];

        let mut in_order = DocumentMerger::new("doc", registry());
        for (idx, r) in batches.iter() {
            in_order.insert(*idx, "products", vec![r.clone()]);
        }

        // Completion order [2, 0, 1] must not change the final sequence.
        let mut shuffled = DocumentMerger::new("doc", registry());
        for pick in [2usize, 0, 1] {
            let (idx, r) = &batches[pick];
            shuffled.insert(*idx, "products", vec![r.clone()]);
        }

        assert_eq!(in_order.finalize(), shuffled.finalize());
    }

    #[test]
    fn test_record_order_follows_chunk_order() {
        let mut merger = DocumentMerger::new("doc", registry());
        merger.insert(2, "products", vec![record(2, "Gamma", "third")]);
        merger.insert(0, "products", vec![record(0, "Alpha", "first")]);
        merger.insert(1, "products", vec![record(1, "Beta", "second")]);

        let result = merger.finalize();
        let names: Vec<_> = result
            .records("products")
            .unwrap()
            .iter()
            .map(|r| r.get("name").unwrap())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_empty_records_suppressed() {
        let mut merger = DocumentMerger::new("doc", registry());
        merger.insert(0, "products", vec![Record::new("doc", 0)]);

        let result = merger.finalize();
        assert!(result.records("products").unwrap().is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_category_batch_dropped() {
        let mut merger = DocumentMerger::new("doc", registry());
        merger.insert(0, "nonexistent", vec![record(0, "X", "y")]);

        let result = merger.finalize();
        assert!(result.records("nonexistent").is_none());
    }

    #[test]
    fn test_every_category_present_in_result() {
        let merger = DocumentMerger::new("doc", registry());
        let result = merger.finalize();
        // Categories with no records still appear, with empty sequences.
        assert_eq!(result.records("products"), Some(&[][..]));
    }
}
