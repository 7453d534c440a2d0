//! Pseudo-embedding of query terms
//!
//! There is no query encoder at request time, so a term vector is
//! synthesized from the index itself: the overlap-weighted average of the
//! vectors of entries sharing words with the term.
//!
//! This is an approximation, not a semantic embedding. It only reacts to
//! exact vocabulary overlap (after lowercasing) and does not generalize to
//! synonyms or morphological variants.

use std::sync::Arc;

use nerala_core::Language;

use crate::index::{word_set, LexicalIndex};

pub struct PseudoEmbedder {
    index: Arc<LexicalIndex>,
}

impl PseudoEmbedder {
    pub fn new(index: Arc<LexicalIndex>) -> Self {
        Self { index }
    }

    /// Synthesize a vector for `term` within one language partition
    ///
    /// - entries overlapping the term: weighted average, weight = overlap / |term words|
    /// - no overlap: mean of the partition vectors
    /// - empty partition (or vectorless index): zero vector
    pub fn embed(&self, term: &str, language: Language) -> Vec<f32> {
        let dim = self.index.dim();
        let partition = self.index.partition(language);
        if partition.is_empty() || !self.index.has_vectors() {
            return vec![0.0; dim];
        }

        let term_words = word_set(term);
        let mut weighted = vec![0.0f32; dim];
        let mut total_weight = 0.0f32;

        if !term_words.is_empty() {
            for &position in partition {
                let (Some(words), Some(vector)) =
                    (self.index.words(position), self.index.vector(position))
                else {
                    continue;
                };

                let overlap = words.combined_overlap(&term_words);
                if overlap == 0 {
                    continue;
                }

                let weight = overlap as f32 / term_words.len() as f32;
                for (acc, x) in weighted.iter_mut().zip(vector) {
                    *acc += weight * x;
                }
                total_weight += weight;
            }
        }

        if total_weight > 0.0 {
            weighted.iter_mut().for_each(|x| *x /= total_weight);
            return weighted;
        }

        self.partition_mean(partition, dim)
    }

    fn partition_mean(&self, partition: &[usize], dim: usize) -> Vec<f32> {
        let mut mean = vec![0.0f32; dim];
        let mut count = 0usize;
        for vector in partition.iter().filter_map(|&p| self.index.vector(p)) {
            for (acc, x) in mean.iter_mut().zip(vector) {
                *acc += x;
            }
            count += 1;
        }
        if count > 0 {
            mean.iter_mut().for_each(|x| *x /= count as f32);
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerala_core::DictionaryEntry;

    fn index() -> Arc<LexicalIndex> {
        let entries = vec![
            DictionaryEntry::new("hello", "jam", Language::Fulfulde),
            DictionaryEntry::new("goodbye", "on yaade", Language::Fulfulde),
            DictionaryEntry::new("hello", "bonjour", Language::French),
        ];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]];
        Arc::new(LexicalIndex::from_parts(entries, vectors).unwrap())
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_single_overlap_returns_entry_vector() {
        let embedder = PseudoEmbedder::new(index());
        assert_close(&embedder.embed("hello", Language::Fulfulde), &[1.0, 0.0]);
        // Translation words count too
        assert_close(&embedder.embed("yaade", Language::Fulfulde), &[0.0, 1.0]);
    }

    #[test]
    fn test_weighted_average() {
        let embedder = PseudoEmbedder::new(index());
        // "hello" hits entry 0, "goodbye" hits entry 1, equal weights
        assert_close(&embedder.embed("hello goodbye", Language::Fulfulde), &[0.5, 0.5]);
    }

    #[test]
    fn test_unequal_weights() {
        let embedder = PseudoEmbedder::new(index());
        // entry 1 overlaps on two words (on, yaade), entry 0 on one (jam)
        assert_close(
            &embedder.embed("jam on yaade", Language::Fulfulde),
            &[1.0 / 3.0, 2.0 / 3.0],
        );
    }

    #[test]
    fn test_no_overlap_returns_partition_mean() {
        let embedder = PseudoEmbedder::new(index());
        assert_close(&embedder.embed("water", Language::Fulfulde), &[0.5, 0.5]);
    }

    #[test]
    fn test_empty_partition_returns_zero_vector() {
        let embedder = PseudoEmbedder::new(index());
        assert_close(&embedder.embed("hello", Language::Ghomala), &[0.0, 0.0]);
    }

    #[test]
    fn test_empty_index() {
        let embedder = PseudoEmbedder::new(Arc::new(LexicalIndex::empty()));
        assert!(embedder.embed("hello", Language::English).is_empty());
    }
}
