//! Extraction categories and their field definitions

use serde::{Deserialize, Serialize};

/// A single field within a category's schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, used as the key in extracted records
    pub name: String,

    /// Human-readable description, embedded into prompts
    #[serde(default)]
    pub description: String,
}

impl Field {
    /// Create a new field definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A named kind of information to extract
///
/// Categories are loaded once from configuration, validated by the
/// [`SchemaRegistry`](crate::SchemaRegistry), and shared read-only for the
/// duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category name (e.g., "products")
    pub name: String,

    /// Human-readable description of what this category captures
    pub description: String,

    /// Ordered field definitions; the first field is the dedup key field
    pub fields: Vec<Field>,
}

impl Category {
    /// Create a new category
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<Field>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            fields,
        }
    }

    /// The field used as the deduplication key: the first declared field
    pub fn key_field(&self) -> &str {
        &self.fields[0].name
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Whether `name` refers to one of this category's fields
    /// (case-insensitive)
    pub fn has_field(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a possibly differently-cased field name to its canonical form
    pub fn canonical_field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> Category {
        Category::new(
            "products",
            "Products mentioned in the text",
            vec![
                Field::new("name", "Product name"),
                Field::new("description", "Short product description"),
            ],
        )
    }

    #[test]
    fn test_key_field_is_first_field() {
        assert_eq!(products().key_field(), "name");
    }

    #[test]
    fn test_has_field_case_insensitive() {
        let cat = products();
        assert!(cat.has_field("name"));
        assert!(cat.has_field("Name"));
        assert!(cat.has_field("DESCRIPTION"));
        assert!(!cat.has_field("price"));
    }

    #[test]
    fn test_canonical_field() {
        let cat = products();
        assert_eq!(cat.canonical_field("NAME"), Some("name"));
        assert_eq!(cat.canonical_field("missing"), None);
    }

    #[test]
    fn test_field_names_order() {
        let cat = products();
        let names: Vec<_> = cat.field_names().collect();
        assert_eq!(names, vec!["name", "description"]);
    }
}
