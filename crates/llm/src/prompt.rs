//! Prompt composition
//!
//! Builds the single-turn generation prompt from the language persona, the
//! domain guardrails and the retrieved dictionary entries.

use nerala_config::constants::rag;
use nerala_config::PromptsConfig;
use nerala_core::{ContextItem, Language};

/// Renders generation prompts from [`PromptsConfig`] templates
#[derive(Debug, Clone)]
pub struct PromptComposer {
    prompts: PromptsConfig,
    /// Context entries rendered into the prompt
    render_limit: usize,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self::new(PromptsConfig::default(), rag::CONTEXT_RENDER_LIMIT)
    }
}

impl PromptComposer {
    pub fn new(prompts: PromptsConfig, render_limit: usize) -> Self {
        Self {
            prompts,
            render_limit: render_limit.max(1),
        }
    }

    /// Text returned to the user when generation is impossible
    pub fn apology(&self) -> &str {
        &self.prompts.apology
    }

    /// Full prompt for a query and its retrieved context
    ///
    /// An empty `context` switches to the no-match template, which asks the
    /// model to admit the gap instead of guessing.
    pub fn compose(
        &self,
        query: &str,
        language: Language,
        context: &[ContextItem],
        extracted_terms: &[String],
    ) -> String {
        let mut sections = vec![
            self.prompts.persona(language.as_str()).to_string(),
            self.prompts.guardrails.clone(),
        ];

        if context.is_empty() {
            sections.push(self.prompts.no_match_instructions.clone());
        } else {
            let entries = context
                .iter()
                .take(self.render_limit)
                .map(|item| format!("- {} → {}", item.phrase, item.translation))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## {} dictionary entries\n{}", language.name(), entries));
        }

        if let Some(note) = terms_note(extracted_terms) {
            sections.push(note);
        }
        sections.push(format!("User query: {}", query));

        if !context.is_empty() {
            sections.push(self.prompts.answer_instructions.clone());
        }

        let mut prompt = sections.join("\n\n");
        prompt.push('\n');
        prompt
    }

    /// Minimal prompt for the retry after a failed generation
    pub fn fallback_prompt(&self, query: &str, language: Language) -> String {
        self.prompts.render_fallback(language.name(), query)
    }
}

/// "The user appears to be asking about: ..." line, when there are terms
fn terms_note(extracted_terms: &[String]) -> Option<String> {
    if extracted_terms.is_empty() {
        return None;
    }
    let quoted = extracted_terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("The user appears to be asking about: {}", quoted))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(phrase: &str, translation: &str) -> ContextItem {
        ContextItem {
            phrase: phrase.to_string(),
            translation: translation.to_string(),
            category: "general".to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_compose_with_context() {
        let composer = PromptComposer::default();
        let prompt = composer.compose(
            "How do I say hello?",
            Language::Fulfulde,
            &[item("hello", "jam")],
            &["hello".to_string()],
        );

        assert!(prompt.starts_with("You are an expert in Fulfulde"));
        assert!(prompt.contains("- hello → jam"));
        assert!(prompt.contains("asking about: \"hello\""));
        assert!(prompt.contains("User query: How do I say hello?"));
        assert!(prompt.contains("pronunciation guidance"));
        assert!(!prompt.contains("No matching entry"));
        assert!(prompt.contains(concat!(
            "## Fulfulde dictionary entries\n- hello → jam\n\n",
            "The user appears to be asking about: \"hello\"\n\n",
            "User query:"
        )));
        assert!(prompt.ends_with('\n'));
    }

    #[test]
    fn test_render_limit() {
        let composer = PromptComposer::default();
        let context: Vec<_> = (0..8).map(|i| item(&format!("p{}", i), "t")).collect();
        let prompt = composer.compose("q", Language::French, &context, &[]);
        assert!(prompt.contains("- p4 → t"));
        assert!(!prompt.contains("- p5 → t"));
        assert!(!prompt.contains("asking about"));
    }

    #[test]
    fn test_compose_without_context() {
        let composer = PromptComposer::default();
        let prompt = composer.compose(
            "What is the word for spaceship?",
            Language::French,
            &[],
            &["spaceship".to_string()],
        );

        assert!(prompt.contains("French language learning assistant"));
        assert!(prompt.contains("No matching entry"));
        assert!(prompt.contains("\"spaceship\""));
        assert!(prompt.contains("User query: What is the word for spaceship?"));
        assert!(!prompt.contains("→"));
    }

    #[test]
    fn test_fallback_prompt() {
        let composer = PromptComposer::default();
        assert_eq!(
            composer.fallback_prompt("hello?", Language::Ghomala),
            "As a Ghomala expert: hello?"
        );
    }

    #[test]
    fn test_custom_persona_override() {
        let mut prompts = PromptsConfig::default();
        prompts.personas.remove("english");
        let composer = PromptComposer::new(prompts, 5);
        let prompt = composer.compose("q", Language::English, &[], &[]);
        assert!(prompt.starts_with("You are a helpful language learning assistant."));
    }
}
