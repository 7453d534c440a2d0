//! Cosine top-k ranking over one language partition

use std::sync::Arc;

use nerala_config::constants::rag;
use nerala_core::{ContextItem, Language};

use crate::embedder::PseudoEmbedder;
use crate::index::LexicalIndex;
use crate::RagError;

pub struct SimilarityRanker {
    index: Arc<LexicalIndex>,
    embedder: PseudoEmbedder,
    /// Items must score strictly above this
    threshold: f32,
    epsilon: f32,
}

impl SimilarityRanker {
    pub fn new(index: Arc<LexicalIndex>, threshold: f32, epsilon: f32) -> Self {
        Self {
            embedder: PseudoEmbedder::new(Arc::clone(&index)),
            index,
            threshold,
            epsilon,
        }
    }

    pub fn with_defaults(index: Arc<LexicalIndex>) -> Self {
        Self::new(index, rag::SIMILARITY_THRESHOLD, rag::NORM_EPSILON)
    }

    /// Top-k entries by cosine similarity to the pseudo-embedded term
    ///
    /// Never fails: internal errors are logged and yield no results.
    pub fn rank_semantic(&self, term: &str, language: Language, top_k: usize) -> Vec<ContextItem> {
        match self.try_rank(term, language, top_k) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(term, language = %language, error = %e, "Semantic ranking failed");
                Vec::new()
            },
        }
    }

    fn try_rank(
        &self,
        term: &str,
        language: Language,
        top_k: usize,
    ) -> Result<Vec<ContextItem>, RagError> {
        let partition = self.index.partition(language);
        if top_k == 0 || !self.index.has_vectors() || partition.is_empty() {
            return Ok(Vec::new());
        }

        let dim = self.index.dim();
        let query = self.embedder.embed(term, language);
        if query.len() != dim {
            return Err(RagError::Dimension {
                expected: dim,
                actual: query.len(),
            });
        }
        let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt() + self.epsilon;

        let mut scored = partition
            .iter()
            .map(|&position| {
                let vector = self
                    .index
                    .vector(position)
                    .ok_or_else(|| RagError::Index(format!("no vector at {}", position)))?;
                if vector.len() != dim {
                    return Err(RagError::Dimension {
                        expected: dim,
                        actual: vector.len(),
                    });
                }

                let norm = self.index.norm(position).unwrap_or(0.0) + self.epsilon;
                let dot: f32 = query.iter().zip(vector).map(|(a, b)| a * b).sum();
                let score = dot / (query_norm * norm);
                if !score.is_finite() {
                    return Err(RagError::Search(format!(
                        "non-finite similarity for entry {}",
                        position
                    )));
                }
                Ok((position, score))
            })
            .collect::<Result<Vec<_>, RagError>>()?;

        // Stable: equal scores keep entry order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let items = scored
            .into_iter()
            .take(top_k)
            .filter(|(_, score)| *score > self.threshold)
            .filter_map(|(position, score)| {
                self.index
                    .entry(position)
                    .map(|entry| ContextItem::from_entry(entry, score))
            })
            .collect::<Vec<_>>();

        tracing::trace!(term, language = %language, results = items.len(), "Semantic ranking");
        Ok(items)
    }
}
