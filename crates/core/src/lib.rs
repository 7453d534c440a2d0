//! Core traits and types for the Nerala lexicon assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Supported languages
//! - Dictionary entries, retrieved context and completion results
//! - The text generation trait implemented by LLM backends
//! - Error types

pub mod error;
pub mod language;
pub mod lexicon;
pub mod traits;

pub use error::{Error, Result};
pub use language::{Language, UnsupportedLanguage};
pub use lexicon::{CompletionResult, ContextItem, DictionaryEntry};
pub use traits::TextGenerator;
