//! Word-overlap fallback ranking
//!
//! Used when the similarity ranker finds nothing or the index carries no
//! vectors.

use std::sync::Arc;

use nerala_core::{ContextItem, Language};

use crate::index::{word_set, LexicalIndex};

pub struct LexicalRanker {
    index: Arc<LexicalIndex>,
}

impl LexicalRanker {
    pub fn new(index: Arc<LexicalIndex>) -> Self {
        Self { index }
    }

    /// Entries sharing words with `term`, best overlap ratio first
    ///
    /// The ratio is computed against the phrase and the translation
    /// separately; the larger one is the entry's score.
    pub fn rank_lexical(&self, term: &str, language: Language, top_k: usize) -> Vec<ContextItem> {
        let term_words = word_set(term);
        let denominator = term_words.len().max(1) as f32;

        let mut scored: Vec<(usize, f32)> = self
            .index
            .partition(language)
            .iter()
            .filter_map(|&position| {
                let words = self.index.words(position)?;
                let phrase_hits = term_words.intersection(&words.phrase).count();
                let translation_hits = term_words.intersection(&words.translation).count();
                let score = phrase_hits.max(translation_hits) as f32 / denominator;
                (score > 0.0).then_some((position, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .filter_map(|(position, score)| {
                self.index
                    .entry(position)
                    .map(|entry| ContextItem::from_entry(entry, score))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerala_core::DictionaryEntry;

    fn ranker() -> LexicalRanker {
        let entries = vec![
            DictionaryEntry::new("good morning", "jam waali", Language::Fulfulde),
            DictionaryEntry::new("good evening", "jam hiiri", Language::Fulfulde),
            DictionaryEntry::new("water", "ndiyam", Language::Fulfulde),
            DictionaryEntry::new("good morning", "bonjour", Language::French),
        ];
        LexicalRanker::new(Arc::new(LexicalIndex::from_parts(entries, vec![]).unwrap()))
    }

    #[test]
    fn test_best_overlap_first() {
        let items = ranker().rank_lexical("good evening", Language::Fulfulde, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].phrase, "good evening");
        assert!((items[0].score - 1.0).abs() < f32::EPSILON);
        assert_eq!(items[1].phrase, "good morning");
        assert!((items[1].score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_translation_side_counts() {
        let items = ranker().rank_lexical("ndiyam", Language::Fulfulde, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].phrase, "water");
    }

    #[test]
    fn test_score_is_max_not_sum() {
        // "good" in the phrase and "jam" in the translation: max(1, 1) / 2
        let items = ranker().rank_lexical("good jam", Language::Fulfulde, 5);
        assert!(items.iter().all(|i| (i.score - 0.5).abs() < f32::EPSILON));
    }

    #[test]
    fn test_ties_keep_entry_order_and_truncate() {
        let items = ranker().rank_lexical("good", Language::Fulfulde, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].phrase, "good morning");
    }

    #[test]
    fn test_no_overlap_or_no_partition() {
        assert!(ranker().rank_lexical("xyz", Language::Fulfulde, 3).is_empty());
        assert!(ranker().rank_lexical("good", Language::Ghomala, 3).is_empty());
        assert!(ranker().rank_lexical("", Language::Fulfulde, 3).is_empty());
    }

    #[test]
    fn test_partition_isolation() {
        let items = ranker().rank_lexical("good morning", Language::French, 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].translation, "bonjour");
    }
}
