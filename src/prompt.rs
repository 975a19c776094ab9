//! Prompt templates and placeholder substitution

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PipelineError, Result};

/// A reusable prompt template containing the transcription placeholder token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: Uuid,
    pub title: String,
    pub template: String,
}

impl PromptTemplate {
    pub fn new(title: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            template: template.into(),
        }
    }
}

/// Fixed catalog of prompt templates offered to the user
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    templates: Vec<PromptTemplate>,
}

impl PromptCatalog {
    /// Catalog seeded with the stock video-summary prompts
    pub fn seeded(placeholder: &str) -> Self {
        let title_template = format!(
            "Generate three catchy YouTube title suggestions for the video \
             transcribed below. The titles should be at most 60 characters \
             long and highlight the main topic.\n\nTranscription:\n'''\n{}\n'''",
            placeholder
        );
        let description_template = format!(
            "Write a concise YouTube description for the video transcribed \
             below, in first person, including the main topics as bullet \
             points.\n\nTranscription:\n'''\n{}\n'''",
            placeholder
        );

        Self {
            templates: vec![
                PromptTemplate::new("YouTube title", title_template),
                PromptTemplate::new("YouTube description", description_template),
            ],
        }
    }

    pub fn list(&self) -> &[PromptTemplate] {
        &self.templates
    }
}

/// Substitute the transcription into the template's placeholder token.
///
/// Fails loudly when the expected token is absent instead of silently
/// leaving the template unresolved.
pub fn resolve_prompt(template: &str, transcription: &str, placeholder: &str) -> Result<String> {
    if !template.contains(placeholder) {
        return Err(PipelineError::Validation(format!(
            "prompt template does not contain the placeholder token {}",
            placeholder
        )));
    }

    Ok(template.replace(placeholder, transcription))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prompt_substitutes_placeholder() {
        let resolved =
            resolve_prompt("Summarize: {transcription}", "hello world", "{transcription}").unwrap();
        assert_eq!(resolved, "Summarize: hello world");
    }

    #[test]
    fn test_resolve_prompt_rejects_missing_placeholder() {
        let result = resolve_prompt("Summarize everything", "hello", "{transcription}");
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn test_resolve_prompt_replaces_every_occurrence() {
        let resolved = resolve_prompt("{t} and again {t}", "x", "{t}").unwrap();
        assert_eq!(resolved, "x and again x");
    }

    #[test]
    fn test_seeded_catalog_templates_carry_placeholder() {
        let catalog = PromptCatalog::seeded("{transcription}");
        assert_eq!(catalog.list().len(), 2);
        for template in catalog.list() {
            assert!(template.template.contains("{transcription}"));
        }
    }
}
