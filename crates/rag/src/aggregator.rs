//! Context aggregation across extracted terms

use std::collections::HashSet;
use std::sync::Arc;

use nerala_config::constants::rag;
use nerala_core::{ContextItem, Language};

use crate::index::LexicalIndex;
use crate::lexical::LexicalRanker;
use crate::similarity::SimilarityRanker;

/// Retrieval configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Semantic matches must score strictly above this
    pub similarity_threshold: f32,
    /// Added to vector norms before normalizing
    pub norm_epsilon: f32,
    /// Shortest extracted term kept (chars)
    pub min_term_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: rag::SIMILARITY_THRESHOLD,
            norm_epsilon: rag::NORM_EPSILON,
            min_term_chars: rag::MIN_TERM_CHARS,
        }
    }
}

impl From<&nerala_config::RagConfig> for RetrievalConfig {
    fn from(config: &nerala_config::RagConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            norm_epsilon: config.norm_epsilon,
            min_term_chars: config.min_term_chars,
        }
    }
}

/// Merges per-term rankings into one bounded, duplicate-free context list
pub struct ContextAggregator {
    semantic: SimilarityRanker,
    lexical: LexicalRanker,
}

impl ContextAggregator {
    pub fn new(index: Arc<LexicalIndex>, config: &RetrievalConfig) -> Self {
        Self {
            semantic: SimilarityRanker::new(
                Arc::clone(&index),
                config.similarity_threshold,
                config.norm_epsilon,
            ),
            lexical: LexicalRanker::new(index),
        }
    }

    /// Semantic ranking, falling back to word overlap when it finds nothing
    fn rank_term(&self, term: &str, language: Language, top_k: usize) -> Vec<ContextItem> {
        let semantic = self.semantic.rank_semantic(term, language, top_k);
        if !semantic.is_empty() {
            return semantic;
        }
        self.lexical.rank_lexical(term, language, top_k)
    }

    /// Context for a query, at most `top_k` items with unique phrases
    ///
    /// Terms are consulted in order and the loop stops once `top_k` items
    /// are collected, so later terms may never be ranked. When no term
    /// yields anything the full query is ranked as a single term.
    pub fn aggregate(
        &self,
        query: &str,
        terms: &[String],
        language: Language,
        top_k: usize,
    ) -> Vec<ContextItem> {
        if top_k == 0 {
            return Vec::new();
        }

        let mut collected = Vec::new();
        for term in terms {
            collected.extend(self.rank_term(term, language, top_k));
            if collected.len() >= top_k {
                break;
            }
        }

        let mut context = dedup_truncate(collected, top_k);

        if context.is_empty() {
            tracing::debug!(
                language = %language,
                "No context from extracted terms, ranking the full query"
            );
            context = dedup_truncate(self.rank_term(query, language, top_k), top_k);
        }

        tracing::debug!(
            language = %language,
            terms = terms.len(),
            top_k,
            results = context.len(),
            "Context aggregated"
        );
        context
    }
}

/// Keep the first item per lowercase phrase, then cut to `top_k`
fn dedup_truncate(items: Vec<ContextItem>, top_k: usize) -> Vec<ContextItem> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ContextItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect();
    unique.truncate(top_k);
    unique
}
