//! Schema registry: validated, read-only category definitions

use crate::category::Category;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while loading the extraction schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema defines no categories at all
    #[error("schema defines no categories")]
    Empty,

    /// A category is missing its description
    #[error("category '{0}' has no description")]
    MissingDescription(String),

    /// A category defines zero fields
    #[error("category '{0}' defines no fields")]
    NoFields(String),

    /// A field within a category has an empty name
    #[error("category '{0}' has a field with an empty name")]
    EmptyFieldName(String),

    /// Two categories share a name (case-insensitive)
    #[error("duplicate category name '{0}' (category names are case-insensitive)")]
    DuplicateCategory(String),
}

/// Holds the extraction schema for a run
///
/// Validated once at load time; read-only afterwards, so it is safe to share
/// across concurrent chunk processing behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    categories: BTreeMap<String, Category>,
}

impl SchemaRegistry {
    /// Build a registry from category definitions
    ///
    /// Fails if a category lacks a description, defines zero fields, or
    /// collides (case-insensitively) with another category's name.
    pub fn from_categories(categories: Vec<Category>) -> Result<Self, SchemaError> {
        if categories.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut map = BTreeMap::new();
        for category in categories {
            if category.description.trim().is_empty() {
                return Err(SchemaError::MissingDescription(category.name));
            }
            if category.fields.is_empty() {
                return Err(SchemaError::NoFields(category.name));
            }
            if category.fields.iter().any(|f| f.name.trim().is_empty()) {
                return Err(SchemaError::EmptyFieldName(category.name));
            }

            let lowered = category.name.to_lowercase();
            if map.contains_key(&lowered) {
                return Err(SchemaError::DuplicateCategory(category.name));
            }
            map.insert(lowered, category);
        }

        Ok(Self { categories: map })
    }

    /// Look up a category by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.get(&name.to_lowercase())
    }

    /// Iterate categories in name order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    /// Category names in iteration order
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.values().map(|c| c.name.as_str()).collect()
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the registry holds no categories (never true after load)
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
