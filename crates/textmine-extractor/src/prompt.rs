//! Prompt templates for per-category extraction requests
//!
//! A [`PromptLibrary`] holds the system persona and one template per
//! category. Building a prompt is pure template substitution; the model call
//! happens elsewhere. Every prompt ends with an explicit output-format
//! instruction so the response parser can apply one consistent grammar.

use crate::error::ExtractorError;
use std::collections::HashMap;
use textmine_schema::Category;

/// Placeholder that must appear in every category template
const TEXT_PLACEHOLDER: &str = "text_chunk";

/// Default persona used when the prompts file supplies none
pub const DEFAULT_PERSONA: &str =
    "You are a meticulous information extraction assistant. You extract only \
     information stated in the provided text and never invent values.";

const OUTPUT_FORMAT_INSTRUCTIONS: &str = r#"Output format (JSON array only, no additional text):
[
  {
{field_lines}
  }
]

Use null for any field the text does not provide. Return [] when the text
contains nothing relevant. No markdown code fences, no explanations."#;

/// Holds the persona and per-category prompt templates for a run
///
/// Read-only after construction; safe to share across concurrent chunk
/// processing.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    persona: String,
    templates: HashMap<String, String>,
}

impl PromptLibrary {
    /// Create a library with the given persona and no category templates
    pub fn new(persona: impl Into<String>) -> Self {
        let persona = persona.into();
        Self {
            persona: if persona.trim().is_empty() {
                DEFAULT_PERSONA.to_string()
            } else {
                persona
            },
            templates: HashMap::new(),
        }
    }

    /// Register a template for a category
    ///
    /// Fails when the template lacks the `{text_chunk}` placeholder, without
    /// which the chunk text could not be embedded.
    pub fn add_template(
        &mut self,
        category: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<(), ExtractorError> {
        let category = category.into();
        let template = template.into();
        if !template.contains(&format!("{{{}}}", TEXT_PLACEHOLDER)) {
            return Err(ExtractorError::Template {
                category,
                placeholder: TEXT_PLACEHOLDER.to_string(),
            });
        }
        self.templates.insert(category.to_lowercase(), template);
        Ok(())
    }

    /// Whether a category has its own template (otherwise the generic
    /// fallback is used)
    pub fn has_template(&self, category: &str) -> bool {
        self.templates.contains_key(&category.to_lowercase())
    }

    /// Build the extraction request for one category and one chunk
    ///
    /// Substitutes `{persona}`, `{category}`, `{description}`, `{fields}`,
    /// and `{text_chunk}`, then appends the output-format instruction.
    pub fn build(&self, category: &Category, chunk_text: &str) -> Result<String, ExtractorError> {
        let template = match self.templates.get(&category.name.to_lowercase()) {
            Some(template) => template.clone(),
            None => generic_template(),
        };

        let body = template
            .replace("{persona}", &self.persona)
            .replace("{category}", &category.name)
            .replace("{description}", &category.description)
            .replace("{fields}", &field_list(category))
            .replace("{text_chunk}", chunk_text);

        // A custom template may substitute its placeholder into odd places;
        // the chunk must end up in the prompt regardless.
        if !body.contains(chunk_text) {
            return Err(ExtractorError::Template {
                category: category.name.clone(),
                placeholder: TEXT_PLACEHOLDER.to_string(),
            });
        }

        let format_block =
            OUTPUT_FORMAT_INSTRUCTIONS.replace("{field_lines}", &field_json_lines(category));

        Ok(format!("{}\n\n{}", body, format_block))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

/// Generic template used for categories without a custom one, assembled from
/// the category's description and field list
fn generic_template() -> String {
    "{persona}\n\n\
     Extract every instance of the category \"{category}\" from the text below.\n\
     Category description: {description}\n\n\
     Fields to extract:\n{fields}\n\n\
     Text:\n---\n{text_chunk}\n---"
        .to_string()
}

fn field_list(category: &Category) -> String {
    category
        .fields
        .iter()
        .map(|f| {
            if f.description.trim().is_empty() {
                format!("- {}", f.name)
            } else {
                format!("- {}: {}", f.name, f.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_json_lines(category: &Category) -> String {
    category
        .fields
        .iter()
        .map(|f| format!("    \"{}\": \"...\"", f.name))
        .collect::<Vec<_>>()
        .join(",\n")
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

    #[test]
    fn test_generic_fallback_embeds_everything() {
        let library = PromptLibrary::default();
        let prompt = library.build(&products(), "ProductX is a CRM tool.").unwrap();

        assert!(prompt.contains("ProductX is a CRM tool."));
        assert!(prompt.contains("products"));
        assert!(prompt.contains("Products mentioned in the text"));
        assert!(prompt.contains("- name: Product name"));
        assert!(prompt.contains("JSON array only"));
        assert!(prompt.contains("\"description\": \"...\""));
    }

    #[test]
    fn test_custom_template_substitution() {
        let mut library = PromptLibrary::new("You are a product analyst.");
        library
            .add_template("products", "{persona}\nFind products in:\n{text_chunk}")
            .unwrap();

        let prompt = library.build(&products(), "some chunk").unwrap();
        assert!(prompt.contains("You are a product analyst."));
        assert!(prompt.contains("Find products in:\nsome chunk"));
        // Output format instruction is always appended.
        assert!(prompt.contains("JSON array only"));
    }

    #[test]
    fn test_template_without_text_placeholder_rejected() {
        let mut library = PromptLibrary::default();
        let result = library.add_template("products", "{persona}\nNo chunk here.");
        assert!(matches!(
            result,
            Err(ExtractorError::Template { ref category, .. }) if category == "products"
        ));
    }

    #[test]
    fn test_template_lookup_is_case_insensitive() {
        let mut library = PromptLibrary::default();
        library
            .add_template("Products", "custom {text_chunk}")
            .unwrap();
        assert!(library.has_template("products"));
        assert!(library.has_template("PRODUCTS"));
    }

    #[test]
    fn test_build_is_pure() {
        let library = PromptLibrary::default();
        let a = library.build(&products(), "chunk").unwrap();
        let b = library.build(&products(), "chunk").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_persona_falls_back_to_default() {
        let library = PromptLibrary::new("   ");
        let prompt = library.build(&products(), "chunk").unwrap();
        assert!(prompt.contains("meticulous information extraction assistant"));
    }
}
