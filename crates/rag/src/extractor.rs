//! Term extraction
//!
//! Finds the word or phrase a user wants translated. An ordered table of
//! intent patterns runs over the lowercased query; quoted spans are also
//! collected from the original-case query. Candidates are merged in
//! first-seen order and deduplicated case-insensitively.

use std::collections::HashSet;

use nerala_config::constants::rag;
use nerala_core::Language;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Typographic quotes trimmed from candidates alongside ASCII punctuation
const TYPOGRAPHIC_QUOTES: &[char] = &['“', '”', '‘', '’', '«', '»', '„'];

/// Which capture group of a match holds the term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSelection {
    /// A fixed group
    Index(usize),
    /// The first group that participated and is not blank
    FirstNonEmpty,
}

impl GroupSelection {
    fn select<'h>(&self, caps: &Captures<'h>) -> Option<&'h str> {
        match self {
            Self::Index(i) => caps.get(*i).map(|m| m.as_str()),
            Self::FirstNonEmpty => caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .find(|s| !s.trim().is_empty()),
        }
    }
}

/// One row of the priority table
#[derive(Debug, Clone)]
pub struct IntentPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub group: GroupSelection,
    /// Also run over the original-case query
    pub scan_original: bool,
}

impl IntentPattern {
    pub fn new(
        name: &'static str,
        pattern: &str,
        group: GroupSelection,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
            group,
            scan_original: false,
        })
    }

    pub fn scanning_original(mut self) -> Self {
        self.scan_original = true;
        self
    }

    /// Raw (untrimmed) candidates for every match in `haystack`
    pub fn candidates<'h>(&self, haystack: &'h str) -> Vec<&'h str> {
        self.regex
            .captures_iter(haystack)
            .filter_map(|caps| self.group.select(&caps))
            .collect()
    }

    /// The default table, in priority order
    pub fn defaults() -> Vec<IntentPattern> {
        DEFAULT_PATTERNS.clone()
    }
}

static DEFAULT_PATTERNS: Lazy<Vec<IntentPattern>> = Lazy::new(build_default_patterns);

fn build_default_patterns() -> Vec<IntentPattern> {
    let langs = Language::all()
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join("|");
    // Optional "in <language>" suffix followed by punctuation or end of input
    let tail = format!(r"(?:\s+(?:in|into|to)\s+(?:{langs})\b)?\s*(?:[?.!,;]|$)");
    // Quotes end a span unless the apostrophe sits inside a word (o'clock)
    let span = r#"((?:[^?.!,;'"“”]|\b'\b)+?)"#;

    let table: Vec<(&'static str, String, GroupSelection)> = vec![
        (
            "how_do_you_say",
            format!(r"\bhow\s+(?:do|would|can|should)\s+(?:you|i|we)\s+say\s+{span}{tail}"),
            GroupSelection::Index(1),
        ),
        (
            "what_is",
            format!(r"\bwhat(?:\s+is|\s+are|\s+does|'s|’s)\s+{span}(?:\s+mean)?{tail}"),
            GroupSelection::Index(1),
        ),
        (
            "translate",
            format!(r"\btranslate\s+{span}{tail}"),
            GroupSelection::Index(1),
        ),
        (
            "meaning_of",
            format!(r"\bmeaning\s+of\s+{span}{tail}"),
            GroupSelection::Index(1),
        ),
        (
            "word_for",
            format!(r"(?:\b(?:{langs})\s+)?\b(?:word|term|phrase|expression)\s+for\s+{span}{tail}"),
            GroupSelection::Index(1),
        ),
        (
            "in_language",
            format!(r"^\s*(.+?)\s+in\s+(?:{langs})\s*[?.!]*\s*$"),
            GroupSelection::Index(1),
        ),
        (
            "quoted",
            // \B keeps single quotes off word edges without consuming the
            // neighbouring character, so adjacent quoted terms all match
            r#""([^"]+)"|“([^”]+)”|\B'([^']+)'\B"#.to_string(),
            GroupSelection::FirstNonEmpty,
        ),
    ];

    table
        .into_iter()
        .filter_map(|(name, pattern, group)| match IntentPattern::new(name, &pattern, group) {
            Ok(p) if name == "quoted" => Some(p.scanning_original()),
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!(pattern = name, error = %e, "Invalid intent pattern");
                None
            },
        })
        .collect()
}

/// Trim surrounding whitespace, punctuation and quotes
fn clean(candidate: &str) -> &str {
    candidate.trim_matches(|c: char| {
        c.is_whitespace() || c.is_ascii_punctuation() || TYPOGRAPHIC_QUOTES.contains(&c)
    })
}

/// Extracts translation targets from a free-text query
#[derive(Debug, Clone)]
pub struct TermExtractor {
    patterns: Vec<IntentPattern>,
    min_term_chars: usize,
}

impl Default for TermExtractor {
    fn default() -> Self {
        Self::new(rag::MIN_TERM_CHARS)
    }
}

impl TermExtractor {
    pub fn new(min_term_chars: usize) -> Self {
        Self::with_patterns(IntentPattern::defaults(), min_term_chars)
    }

    pub fn with_patterns(patterns: Vec<IntentPattern>, min_term_chars: usize) -> Self {
        Self {
            patterns,
            min_term_chars: min_term_chars.max(rag::MIN_TERM_CHARS),
        }
    }

    /// Candidate terms in first-seen order, unique case-insensitively
    pub fn extract(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();

        let from_patterns = self
            .patterns
            .iter()
            .flat_map(|p| p.candidates(&lowered));
        let from_original = self
            .patterns
            .iter()
            .filter(|p| p.scan_original)
            .flat_map(|p| p.candidates(query));

        let mut seen = HashSet::new();
        let mut terms = Vec::new();
        for candidate in from_patterns.chain(from_original) {
            let term = clean(candidate);
            if term.chars().count() < self.min_term_chars {
                continue;
            }
            if seen.insert(term.to_lowercase()) {
                terms.push(term.to_string());
            }
        }

        tracing::debug!(terms = ?terms, "Extracted terms");
        terms
    }
}
