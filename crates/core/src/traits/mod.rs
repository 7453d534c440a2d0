//! Core traits for the Nerala system
//!
//! ```text
//! Language Models:
//!   - TextGenerator: prompt in, text out (Gemini, test stubs)
//! ```

mod generator;

pub use generator::TextGenerator;
