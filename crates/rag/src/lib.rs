//! Lexicon retrieval for translation questions
//!
//! Features:
//! - Language-partitioned lexical index built from a snapshot file or the Hugging Face Hub
//! - Ordered intent-pattern term extraction
//! - Pseudo-embedding of query terms from the index vectors
//! - Cosine top-k ranking with a lexical overlap fallback
//! - Context aggregation with deduplication and a bounded result size

pub mod aggregator;
pub mod embedder;
pub mod extractor;
pub mod index;
pub mod lexical;
pub mod similarity;
pub mod snapshot;

pub use aggregator::{ContextAggregator, RetrievalConfig};
pub use embedder::PseudoEmbedder;
pub use extractor::{GroupSelection, IntentPattern, TermExtractor};
pub use index::{word_set, LexicalIndex};
pub use lexical::LexicalRanker;
pub use similarity::SimilarityRanker;
pub use snapshot::{Snapshot, SnapshotLoader, SnapshotRecord};

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("Search error: {0}")]
    Search(String),

    #[error("Download error: {0}")]
    Download(String),
}

impl From<RagError> for nerala_core::Error {
    fn from(err: RagError) -> Self {
        nerala_core::Error::Rag(err.to_string())
    }
}
