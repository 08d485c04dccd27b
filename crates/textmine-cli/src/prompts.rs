//! Prompt customization file.
//!
//! An optional TOML file overrides the built-in persona and supplies
//! per-category prompt templates. Templates must contain the `{text_chunk}`
//! placeholder; categories without a template fall back to the generic one.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use textmine_extractor::PromptLibrary;

/// Contents of a prompts TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsFile {
    /// Persona prepended to every prompt; empty means the built-in one
    #[serde(default)]
    pub persona: String,

    /// Category name to its prompt entry
    #[serde(default)]
    pub prompts: BTreeMap<String, PromptEntry>,
}

/// One `[prompts.<category>]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEntry {
    /// The prompt template; must contain `{text_chunk}`
    pub template: String,
}

impl PromptsFile {
    /// Load a prompts file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    CliError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Convert into a validated [`PromptLibrary`].
    pub fn into_library(self) -> Result<PromptLibrary> {
        let mut library = PromptLibrary::new(self.persona);
        for (category, entry) in self.prompts {
            library.add_template(category, entry.template)?;
        }
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_default_library() {
        let prompts: PromptsFile = toml::from_str("").unwrap();
        assert!(prompts.persona.is_empty());
        assert!(prompts.into_library().is_ok());
    }

    #[test]
    fn test_custom_template_is_registered() {
        let toml_str = r#"
            persona = "You are a meticulous analyst."

            [prompts.products]
            template = "{persona}\nList products in:\n{text_chunk}"
        "#;
        let prompts: PromptsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(prompts.persona, "You are a meticulous analyst.");
        let library = prompts.into_library().unwrap();
        assert!(library.has_template("products"));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let toml_str = r#"
            [prompts.products]
            template = "List products, please."
        "#;
        let prompts: PromptsFile = toml::from_str(toml_str).unwrap();
        assert!(prompts.into_library().is_err());
    }
}
