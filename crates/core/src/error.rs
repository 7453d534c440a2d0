//! Error types shared across crates

use thiserror::Error;

/// Top-level error for the Nerala crates.
///
/// Crate-local errors (`RagError`, `LlmError`, `ConfigError`) convert into
/// this type at crate boundaries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
