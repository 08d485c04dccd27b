//! Parse and repair model output into records
//!
//! The primary grammar is the one the prompt instructs: a JSON array of
//! field-value objects. Models do not reliably comply, so a repair path
//! recovers `field: value` lines anchored on the category's field names.
//! Parsing never fails; the worst outcome is an empty record list.

use serde_json::Value;
use textmine_schema::{Category, Record};
use tracing::debug;

/// Result of parsing one raw model response
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The response matched the instructed grammar
    Clean(Vec<Record>),

    /// Strict parsing failed; records were recovered line-by-line and the
    /// given number of lines could not be attributed to any field
    Recovered(Vec<Record>, usize),
}

impl ParseOutcome {
    /// The parsed records, whichever path produced them
    pub fn records(&self) -> &[Record] {
        match self {
            ParseOutcome::Clean(records) | ParseOutcome::Recovered(records, _) => records,
        }
    }

    /// Consume into (records, discarded line count)
    pub fn into_parts(self) -> (Vec<Record>, usize) {
        match self {
            ParseOutcome::Clean(records) => (records, 0),
            ParseOutcome::Recovered(records, discarded) => (records, discarded),
        }
    }
}

/// Parse a raw model response for one category and one chunk
///
/// `document_id` and `chunk_index` become the provenance tag on every
/// produced record. All-empty records are dropped on both paths.
pub fn parse_response(
    raw: &str,
    category: &Category,
    document_id: &str,
    chunk_index: usize,
) -> ParseOutcome {
    let stripped = strip_code_fences(raw);

    if stripped.is_empty() {
        return ParseOutcome::Clean(Vec::new());
    }

    if let Ok(json) = serde_json::from_str::<Value>(stripped) {
        if let Some(records) = records_from_json(&json, category, document_id, chunk_index) {
            return ParseOutcome::Clean(records);
        }
    }

    debug!(
        category = %category.name,
        chunk_index,
        "strict parse failed, applying line-based recovery"
    );
    let (records, discarded) = recover_lines(stripped, category, document_id, chunk_index);
    ParseOutcome::Recovered(records, discarded)
}

/// Strip a markdown code fence wrapper, if present
///
/// Models often wrap their output in ```json fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g., "json") up to the first newline.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => return trimmed,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Interpret a JSON value as a record list; `None` when the shape is wrong
fn records_from_json(
    json: &Value,
    category: &Category,
    document_id: &str,
    chunk_index: usize,
) -> Option<Vec<Record>> {
    let objects: Vec<&Value> = match json {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![json],
        _ => return None,
    };

    let mut records = Vec::new();
    for object in objects {
        let map = object.as_object()?;
        let mut record = Record::new(document_id, chunk_index);
        for (key, value) in map {
            // Unknown keys are ignored; known keys are canonicalized.
            let Some(field) = category.canonical_field(key) else {
                continue;
            };
            record.set(field, json_value_as_str(value).as_deref());
        }
        if !record.is_empty() {
            records.push(record);
        }
    }
    Some(records)
}

fn json_value_as_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Best-effort `field: value` line recovery
///
/// A line assigning a field that is already set on the current record (or
/// re-assigning the key field) starts a new record. Non-empty lines that
/// cannot be attributed to a known field are counted as discarded.
fn recover_lines(
    text: &str,
    category: &Category,
    document_id: &str,
    chunk_index: usize,
) -> (Vec<Record>, usize) {
    let mut records = Vec::new();
    let mut current = Record::new(document_id, chunk_index);
    let mut discarded = 0;

    for line in text.lines() {
        let line = line
            .trim()
            .trim_start_matches(['-', '*'])
            .trim_start();
        if line.is_empty() {
            continue;
        }

        let Some((left, right)) = line.split_once(':') else {
            discarded += 1;
            continue;
        };
        let key = left.trim().trim_matches(['"', '\'']);
        let Some(field) = category.canonical_field(key) else {
            discarded += 1;
            continue;
        };
        let value = right.trim().trim_end_matches(',').trim_matches(['"', '\'']);

        if current.has_value_for(field) {
            if !current.is_empty() {
                records.push(current);
            }
            current = Record::new(document_id, chunk_index);
        }
        current.set(field, Some(value));
    }

    if !current.is_empty() {
        records.push(current);
    }
    (records, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use textmine_schema::Field;

    fn products() -> Category {
        Category::new(
            "products",
            "Products mentioned in the text",
            vec![
                Field::new("name", "Product name"),
                Field::new("description", "Short description"),
            ],
        )
    }

    fn parse(raw: &str) -> ParseOutcome {
        parse_response(raw, &products(), "doc", 0)
    }

    #[test]
    fn test_clean_json_array() {
        let outcome = parse(r#"[{"name": "ProductX", "description": "CRM tool"}]"#);
        let ParseOutcome::Clean(records) = outcome else {
            panic!("expected clean parse");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("ProductX"));
        assert_eq!(records[0].get("description"), Some("CRM tool"));
        assert_eq!(records[0].provenance().unwrap().chunk_index, 0);
    }

    #[test]
    fn test_single_object_accepted() {
        let outcome = parse(r#"{"name": "ProductX"}"#);
        assert_eq!(outcome.records().len(), 1);
    }

    #[test]
    fn test_markdown_fence_stripped() {
        let raw = "```json\n[{\"name\": \"ProductX\", \"description\": null}]\n```";
        let outcome = parse(raw);
        assert!(matches!(outcome, ParseOutcome::Clean(_)));
        assert_eq!(outcome.records().len(), 1);
        assert_eq!(outcome.records()[0].get("description"), None);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n[{\"name\": \"ProductX\"}]\n```";
        assert_eq!(parse(raw).records().len(), 1);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let outcome = parse(r#"[{"name": "ProductX", "price": "99"}]"#);
        let records = outcome.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("ProductX"));
        assert_eq!(records[0].get("price"), None);
    }

    #[test]
    fn test_numeric_values_coerced() {
        let outcome = parse(r#"[{"name": 42}]"#);
        assert_eq!(outcome.records()[0].get("name"), Some("42"));
    }

    #[test]
    fn test_all_null_record_dropped() {
        let outcome = parse(r#"[{"name": null, "description": ""}, {"name": "Kept"}]"#);
        let records = outcome.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("Kept"));
    }

    #[test]
    fn test_empty_response_is_clean_empty() {
        assert_eq!(parse(""), ParseOutcome::Clean(Vec::new()));
        assert_eq!(parse("   \n"), ParseOutcome::Clean(Vec::new()));
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(parse("[]"), ParseOutcome::Clean(Vec::new()));
    }

    #[test]
    fn test_line_recovery() {
        let raw = "Here is what I found:\n\
                   name: ProductX\n\
                   description: CRM tool\n\
                   name: ProductY\n\
                   description: Billing tool";
        let ParseOutcome::Recovered(records, discarded) = parse(raw) else {
            panic!("expected recovery path");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("ProductX"));
        assert_eq!(records[1].get("name"), Some("ProductY"));
        assert_eq!(records[1].get("description"), Some("Billing tool"));
        // "Here is what I found:" has no known field on the left.
        assert_eq!(discarded, 1);
    }

    #[test]
    fn test_recovery_with_list_markers_and_quotes() {
        let raw = "- name: \"ProductX\"\n- description: 'CRM tool',";
        let ParseOutcome::Recovered(records, discarded) = parse(raw) else {
            panic!("expected recovery path");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("name"), Some("ProductX"));
        assert_eq!(records[0].get("description"), Some("CRM tool"));
        assert_eq!(discarded, 0);
    }

    #[test]
    fn test_recovery_field_names_case_insensitive() {
        let raw = "Name: ProductX\nDESCRIPTION: CRM tool";
        let records = match parse(raw) {
            ParseOutcome::Recovered(records, _) => records,
            other => panic!("expected recovery, got {:?}", other),
        };
        assert_eq!(records[0].get("name"), Some("ProductX"));
        assert_eq!(records[0].get("description"), Some("CRM tool"));
    }

    #[test]
    fn test_unrecognizable_text_yields_empty() {
        let raw = "I could not find anything relevant in this text, sorry!";
        let ParseOutcome::Recovered(records, discarded) = parse(raw) else {
            panic!("expected recovery path");
        };
        assert!(records.is_empty());
        assert!(discarded >= 1);
    }

    #[test]
    fn test_never_panics_on_garbage() {
        for raw in ["{", "[{]", "::::", "\u{0}\u{1}", "```", "```json"] {
            let _ = parse(raw);
        }
    }
}
