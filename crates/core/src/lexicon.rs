//! Lexicon data types
//!
//! Entries are loaded once from the snapshot and never mutated; context items
//! and completion results live for a single request.

use serde::{Deserialize, Serialize};

use crate::Language;

fn default_category() -> String {
    "general".to_string()
}

/// A single dictionary entry from the lexicon snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Source phrase
    pub phrase: String,
    /// Translation of the phrase
    pub translation: String,
    /// Semantic category (greetings, numbers, ...)
    #[serde(default = "default_category")]
    pub category: String,
    /// Language partition this entry belongs to
    pub language: Language,
}

impl DictionaryEntry {
    pub fn new(
        phrase: impl Into<String>,
        translation: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            phrase: phrase.into(),
            translation: translation.into(),
            category: default_category(),
            language,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// A retrieved dictionary entry with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub phrase: String,
    pub translation: String,
    pub category: String,
    /// Cosine similarity (semantic path) or overlap ratio (lexical path)
    pub score: f32,
}

impl ContextItem {
    pub fn from_entry(entry: &DictionaryEntry, score: f32) -> Self {
        Self {
            phrase: entry.phrase.clone(),
            translation: entry.translation.clone(),
            category: entry.category.clone(),
            score,
        }
    }

    /// Key used to deduplicate aggregated context
    pub fn dedup_key(&self) -> String {
        self.phrase.to_lowercase()
    }
}

/// Result of a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    /// Generated answer
    pub response: String,
    /// Phrases of the context entries used to ground the answer
    pub sources: Vec<String>,
    pub language: Language,
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_default_category() {
        let entry: DictionaryEntry = serde_json::from_str(
            r#"{"phrase": "hello", "translation": "jam", "language": "fulfulde"}"#,
        )
        .unwrap();
        assert_eq!(entry.category, "general");
        assert_eq!(entry.language, Language::Fulfulde);
    }

    #[test]
    fn test_context_item_dedup_key() {
        let entry = DictionaryEntry::new("Thank You", "a jaraama", Language::Fulfulde);
        let item = ContextItem::from_entry(&entry, 0.5);
        assert_eq!(item.dedup_key(), "thank you");
        assert_eq!(item.category, "general");
    }

    #[test]
    fn test_completion_result_serialization() {
        let result = CompletionResult {
            response: "Jam".to_string(),
            sources: vec!["hello".to_string()],
            language: Language::Fulfulde,
            query: "How do I say hello?".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["language"], "fulfulde");
        assert_eq!(json["sources"][0], "hello");
    }
}
