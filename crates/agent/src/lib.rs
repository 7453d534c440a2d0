//! Completion orchestration
//!
//! Sequences term extraction, context aggregation, prompt composition and
//! generation for one request, degrading to a plain fallback prompt and
//! finally to a fixed apology when generation fails.

pub mod orchestrator;

pub use orchestrator::CompletionOrchestrator;
