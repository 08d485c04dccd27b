//! Extracted records and the deduplication equivalence rule

use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a record came from: used for merge tie-breaking and debugging,
/// never serialized into the output artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Document the record was extracted from
    pub document_id: String,

    /// Index of the chunk the record was extracted from
    pub chunk_index: usize,
}

/// One extracted instance of a category's fields from one chunk
///
/// Values are keyed by field name; a missing or empty value is `None`.
/// Records with every value `None` are considered noise and are never merged
/// into an [`ExtractionResult`](crate::ExtractionResult).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Field name to extracted value
    #[serde(flatten)]
    values: BTreeMap<String, Option<String>>,

    /// Provenance tag, not part of the persisted artifact
    #[serde(skip)]
    provenance: Option<Provenance>,
}

impl Record {
    /// Create an empty record with provenance
    pub fn new(document_id: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            values: BTreeMap::new(),
            provenance: Some(Provenance {
                document_id: document_id.into(),
                chunk_index,
            }),
        }
    }

    /// Create an empty record without provenance (tests, deserialization)
    pub fn detached() -> Self {
        Self {
            values: BTreeMap::new(),
            provenance: None,
        }
    }

    /// Set a field value; trims whitespace and maps empty strings to `None`
    pub fn set(&mut self, field: impl Into<String>, value: Option<&str>) {
        let value = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self.values.insert(field.into(), value);
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(|v| v.as_deref())
    }

    /// Whether the field holds a present (non-`None`) value
    pub fn has_value_for(&self, field: &str) -> bool {
        self.values.get(field).is_some_and(|v| v.is_some())
    }

    /// Provenance tag, if the record carries one
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// True when every field value is `None` or the record holds no fields
    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_none())
    }

    /// Deduplication equivalence
    ///
    /// Two records are duplicates when their key-field values (the first
    /// field of `category`) are both present and agree after case-insensitive
    /// whitespace normalization. When either key value is absent, they are
    /// duplicates only if all field values match under the same normalization.
    pub fn is_duplicate_of(&self, other: &Record, category: &Category) -> bool {
        let key = category.key_field();
        match (self.get(key), other.get(key)) {
            (Some(a), Some(b)) => normalize(a) == normalize(b),
            _ => category.field_names().all(|f| {
                match (self.get(f), other.get(f)) {
                    (Some(a), Some(b)) => normalize(a) == normalize(b),
                    (None, None) => true,
                    _ => false,
                }
            }),
        }
    }
}

/// Lowercase and collapse runs of whitespace to a single space
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
