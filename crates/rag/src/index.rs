//! Lexical index
//!
//! Immutable, language-partitioned table of dictionary entries with their
//! snapshot vectors. Built once at startup and shared behind an `Arc`.

use std::collections::{BTreeMap, HashSet};

use nerala_core::{DictionaryEntry, Language};
use unicode_segmentation::UnicodeSegmentation;

use crate::snapshot::Snapshot;
use crate::RagError;

/// Lowercased Unicode word set of a text
///
/// Punctuation never becomes part of a token.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .unicode_words()
        .map(str::to_string)
        .collect()
}

/// Pre-tokenized phrase and translation of one entry
#[derive(Debug, Clone, Default)]
pub struct EntryWords {
    pub phrase: HashSet<String>,
    pub translation: HashSet<String>,
}

impl EntryWords {
    fn new(entry: &DictionaryEntry) -> Self {
        Self {
            phrase: word_set(&entry.phrase),
            translation: word_set(&entry.translation),
        }
    }

    /// Number of `terms` found in either the phrase or the translation
    pub fn combined_overlap(&self, terms: &HashSet<String>) -> usize {
        terms
            .iter()
            .filter(|w| self.phrase.contains(*w) || self.translation.contains(*w))
            .count()
    }
}

/// Language-partitioned lexicon
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    entries: Vec<DictionaryEntry>,
    words: Vec<EntryWords>,
    /// Empty when the index is vectorless
    vectors: Vec<Vec<f32>>,
    norms: Vec<f32>,
    dim: usize,
    partitions: BTreeMap<Language, Vec<usize>>,
}

impl LexicalIndex {
    /// The "no knowledge available" index
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from aligned entries and vectors
    ///
    /// `vectors` may be empty for a vectorless index; otherwise it must hold
    /// exactly one vector per entry, all of the same non-zero length.
    pub fn from_parts(
        entries: Vec<DictionaryEntry>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, RagError> {
        let dim = if vectors.is_empty() {
            0
        } else {
            if vectors.len() != entries.len() {
                return Err(RagError::Index(format!(
                    "{} embeddings for {} entries",
                    vectors.len(),
                    entries.len()
                )));
            }

            let dim = vectors[0].len();
            if dim == 0 {
                return Err(RagError::Index("zero-length embedding vectors".to_string()));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
                return Err(RagError::Dimension {
                    expected: dim,
                    actual: bad.len(),
                });
            }
            dim
        };

        let mut partitions: BTreeMap<Language, Vec<usize>> = BTreeMap::new();
        for (position, entry) in entries.iter().enumerate() {
            partitions.entry(entry.language).or_default().push(position);
        }

        let words = entries.iter().map(EntryWords::new).collect();
        let norms = vectors
            .iter()
            .map(|v| v.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect();

        Ok(Self {
            entries,
            words,
            vectors,
            norms,
            dim,
            partitions,
        })
    }

    /// Build from a parsed snapshot
    ///
    /// Records in a language outside the supported set are dropped together
    /// with their vector so positions stay aligned.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RagError> {
        let Snapshot {
            embeddings,
            metadata,
            model_info,
        } = snapshot;

        let has_vectors = !embeddings.is_empty();
        if has_vectors && embeddings.len() != metadata.len() {
            return Err(RagError::Index(format!(
                "snapshot has {} embeddings but {} metadata records",
                embeddings.len(),
                metadata.len()
            )));
        }

        let mut entries = Vec::with_capacity(metadata.len());
        let mut vectors = Vec::with_capacity(embeddings.len());
        let mut embeddings = embeddings.into_iter();

        for record in metadata {
            let vector = embeddings.next();
            let language = match record.language.parse::<Language>() {
                Ok(language) => language,
                Err(e) => {
                    tracing::warn!(phrase = %record.phrase, error = %e, "Skipping snapshot record");
                    continue;
                },
            };

            entries.push(
                DictionaryEntry::new(record.phrase, record.translation, language)
                    .with_category(record.category),
            );
            if let Some(vector) = vector {
                vectors.push(vector);
            }
        }

        let index = Self::from_parts(entries, vectors)?;

        tracing::info!(
            entries = index.len(),
            dimension = index.dim(),
            has_vectors = index.has_vectors(),
            model_info = %model_info,
            "Lexical index built"
        );

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimensionality (0 for a vectorless index)
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn has_vectors(&self) -> bool {
        !self.vectors.is_empty()
    }

    pub fn entry(&self, position: usize) -> Option<&DictionaryEntry> {
        self.entries.get(position)
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    /// L2 norm of the vector at `position`
    pub fn norm(&self, position: usize) -> Option<f32> {
        self.norms.get(position).copied()
    }

    pub fn words(&self, position: usize) -> Option<&EntryWords> {
        self.words.get(position)
    }

    /// Entry positions of a language, in snapshot order
    pub fn partition(&self, language: Language) -> &[usize] {
        self.partitions
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Languages that have at least one entry, in declaration order
    pub fn languages(&self) -> Vec<Language> {
        self.partitions.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotRecord;

    fn record(phrase: &str, translation: &str, language: &str) -> SnapshotRecord {
        SnapshotRecord {
            phrase: phrase.to_string(),
            translation: translation.to_string(),
            category: "general".to_string(),
            language: language.to_string(),
        }
    }

    #[test]
    fn test_word_set_strips_punctuation() {
        let words = word_set("Hello, World! \"thank-you\"");
        assert!(words.contains("hello"));
        assert!(words.contains("world"));
        assert!(!words.iter().any(|w| w.contains(',') || w.contains('"')));
    }

    #[test]
    fn test_partitions_cover_all_positions() {
        let snapshot = Snapshot {
            embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            metadata: vec![
                record("hello", "jam", "fulfulde"),
                record("hello", "bonjour", "french"),
                record("thank you", "a jaraama", "fulfulde"),
            ],
            model_info: serde_json::Value::Null,
        };
        let index = LexicalIndex::from_snapshot(snapshot).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.dim(), 2);
        assert_eq!(index.partition(Language::Fulfulde), &[0, 2]);
        assert_eq!(index.partition(Language::French), &[1]);
        assert!(index.partition(Language::Ghomala).is_empty());
        assert_eq!(index.languages(), vec![Language::Fulfulde, Language::French]);

        let mut covered: Vec<usize> = index
            .languages()
            .into_iter()
            .flat_map(|l| index.partition(l).to_vec())
            .collect();
        covered.sort_unstable();
        assert_eq!(covered, vec![0, 1, 2]);
    }

    #[test]
    fn test_unknown_language_skipped_with_vector() {
        let snapshot = Snapshot {
            embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
            metadata: vec![
                record("hello", "jam", "fulfulde"),
                record("hello", "hallo", "german"),
                record("water", "ndiyam", "fulfulde"),
            ],
            model_info: serde_json::Value::Null,
        };
        let index = LexicalIndex::from_snapshot(snapshot).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.entry(1).unwrap().phrase, "water");
        assert_eq!(index.vector(1).unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn test_vectorless_snapshot() {
        let snapshot = Snapshot {
            embeddings: vec![],
            metadata: vec![record("hello", "jam", "fulfulde")],
            model_info: serde_json::Value::Null,
        };
        let index = LexicalIndex::from_snapshot(snapshot).unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.has_vectors());
        assert_eq!(index.dim(), 0);
    }

    #[test]
    fn test_misaligned_snapshot_rejected() {
        let snapshot = Snapshot {
            embeddings: vec![vec![1.0, 0.0]],
            metadata: vec![
                record("hello", "jam", "fulfulde"),
                record("water", "ndiyam", "fulfulde"),
            ],
            model_info: serde_json::Value::Null,
        };
        assert!(LexicalIndex::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn test_ragged_vectors_rejected() {
        let entries = vec![
            DictionaryEntry::new("a", "b", Language::English),
            DictionaryEntry::new("c", "d", Language::English),
        ];
        let err = LexicalIndex::from_parts(entries, vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, RagError::Dimension { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_empty_index() {
        let index = LexicalIndex::empty();
        assert!(index.is_empty());
        assert!(index.languages().is_empty());
        assert!(index.partition(Language::English).is_empty());
        assert!(index.entry(0).is_none());
    }

    #[test]
    fn test_norms_precomputed() {
        let entries = vec![DictionaryEntry::new("a", "b", Language::English)];
        let index = LexicalIndex::from_parts(entries, vec![vec![3.0, 4.0]]).unwrap();
        assert!((index.norm(0).unwrap() - 5.0).abs() < 1e-6);
    }
}
