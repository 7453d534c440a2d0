//! Text generation for lexicon answers
//!
//! Features:
//! - Gemini `generateContent` backend with optional retry on transient failures
//! - Adapter bridging any backend to the core `TextGenerator` trait
//! - Prompt composition from language personas and retrieved dictionary entries

pub mod adapter;
pub mod backend;
pub mod prompt;

pub use adapter::GeneratorAdapter;
pub use backend::{FinishReason, GeminiBackend, GeminiConfig, GenerationResult, LlmBackend};
pub use prompt::PromptComposer;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for nerala_core::Error {
    fn from(err: LlmError) -> Self {
        nerala_core::Error::Llm(err.to_string())
    }
}
