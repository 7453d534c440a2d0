//! Supported lexicon languages
//!
//! Two Cameroonian languages (Fulfulde, Ghomala) plus the two official
//! languages the lexicon translates from and into.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Languages the lexicon and the completion endpoint understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fulfulde,
    Ghomala,
    English,
    French,
}

/// Returned when a string does not name a supported language
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    /// Wire name, as used in requests, snapshots and prompt templates
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfulde => "fulfulde",
            Self::Ghomala => "ghomala",
            Self::English => "english",
            Self::French => "french",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fulfulde => "Fulfulde",
            Self::Ghomala => "Ghomala",
            Self::English => "English",
            Self::French => "French",
        }
    }


    /// All supported languages, in declaration order
    pub fn all() -> &'static [Language] {
        &[Self::Fulfulde, Self::Ghomala, Self::English, Self::French]
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Strict parse of the wire name (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|l| l.as_str() == lower)
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str() {
        assert_eq!("fulfulde".parse::<Language>(), Ok(Language::Fulfulde));
        assert_eq!(" French ".parse::<Language>(), Ok(Language::French));
        assert!("spanish".parse::<Language>().is_err());
        // Strict parse only accepts wire names
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Language::Ghomala).unwrap();
        assert_eq!(json, "\"ghomala\"");
        let parsed: Language = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(parsed, Language::English);
    }

    #[test]
    fn test_all_languages() {
        assert_eq!(Language::all().len(), 4);
        assert_eq!(Language::all()[0], Language::Fulfulde);
    }
}
