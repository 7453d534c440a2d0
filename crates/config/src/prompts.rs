//! Prompt templates
//!
//! Persona preambles and instruction blocks used by the prompt composer.
//! The built-in defaults can be replaced wholesale or in part from a YAML
//! file; any key missing from the file keeps its default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptsConfigError {
    #[error("Prompts file not found: {0}: {1}")]
    FileNotFound(String, String),

    #[error("Failed to parse prompts file: {0}")]
    ParseError(String),
}

impl From<PromptsConfigError> for nerala_core::Error {
    fn from(err: PromptsConfigError) -> Self {
        nerala_core::Error::Config(err.to_string())
    }
}

/// Prompt templates keyed by language code (`fulfulde`, `ghomala`, ...)
///
/// `fallback_template` understands the `{language}` and `{query}`
/// placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default = "default_personas")]
    pub personas: HashMap<String, String>,

    #[serde(default = "default_persona")]
    pub default_persona: String,

    /// Restricts answers to the language-learning domain
    #[serde(default = "default_guardrails")]
    pub guardrails: String,

    /// Closing instructions when lexicon entries were found
    #[serde(default = "default_answer_instructions")]
    pub answer_instructions: String,

    /// Closing instructions when nothing matched
    #[serde(default = "default_no_match_instructions")]
    pub no_match_instructions: String,

    #[serde(default = "default_fallback_template")]
    pub fallback_template: String,

    /// Returned to the caller when generation fails twice
    #[serde(default = "default_apology")]
    pub apology: String,
}

fn default_personas() -> HashMap<String, String> {
    let mut personas = HashMap::new();
    personas.insert(
        "fulfulde".to_string(),
        "You are an expert in Fulfulde (Fula) language and culture. \
         Fulfulde is spoken by the Fula people across West and Central Africa. \
         Provide accurate translations, cultural context, and pronunciation guidance when relevant."
            .to_string(),
    );
    personas.insert(
        "ghomala".to_string(),
        "You are an expert in Ghomala language and Bamileke culture. \
         Ghomala is spoken by the Bamileke people in the Western Region of Cameroon. \
         Provide accurate translations, cultural context, and pronunciation guidance when relevant."
            .to_string(),
    );
    personas.insert(
        "english".to_string(),
        "You are an English language learning assistant. \
         Provide clear explanations, grammar rules, and usage examples."
            .to_string(),
    );
    personas.insert(
        "french".to_string(),
        "You are a French language learning assistant. \
         Provide accurate translations, grammar explanations, and cultural context."
            .to_string(),
    );
    personas
}

fn default_persona() -> String {
    "You are a helpful language learning assistant.".to_string()
}

fn default_guardrails() -> String {
    "Only answer questions about vocabulary, translation, pronunciation, grammar \
     and culture of the language above. If the question is unrelated to language \
     learning, politely say that you can only help with language questions. \
     Never invent dictionary entries."
        .to_string()
}

fn default_answer_instructions() -> String {
    "Answer using the translations listed above. \
     If providing translations, include pronunciation guidance when possible. \
     Keep your response conversational and educational."
        .to_string()
}

fn default_no_match_instructions() -> String {
    "No matching entry was found in the dictionary for this question. \
     Say so honestly instead of guessing a translation. \
     You may suggest related words or phrases the learner could look up instead."
        .to_string()
}

fn default_fallback_template() -> String {
    "As a {language} expert: {query}".to_string()
}

fn default_apology() -> String {
    "I'm sorry, I couldn't process your request right now. Please try again later.".to_string()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            personas: default_personas(),
            default_persona: default_persona(),
            guardrails: default_guardrails(),
            answer_instructions: default_answer_instructions(),
            no_match_instructions: default_no_match_instructions(),
            fallback_template: default_fallback_template(),
            apology: default_apology(),
        }
    }
}

impl PromptsConfig {
    /// Load templates from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PromptsConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PromptsConfigError::FileNotFound(path.as_ref().display().to_string(), e.to_string())
        })?;

        serde_yaml::from_str(&content).map_err(|e| PromptsConfigError::ParseError(e.to_string()))
    }

    /// Persona for a language code, or the default persona
    pub fn persona(&self, language_key: &str) -> &str {
        self.personas
            .get(language_key)
            .map(String::as_str)
            .unwrap_or(&self.default_persona)
    }

    /// Render the fallback template
    pub fn render_fallback(&self, language_name: &str, query: &str) -> String {
        self.fallback_template
            .replace("{language}", language_name)
            .replace("{query}", query)
    }
}
