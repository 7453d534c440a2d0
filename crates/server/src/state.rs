//! Application State
//!
//! Shared state across all handlers. Everything is read-only after startup.

use std::sync::Arc;

use nerala_agent::CompletionOrchestrator;
use nerala_config::{PromptsConfig, Settings};
use nerala_core::TextGenerator;
use nerala_rag::LexicalIndex;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Lexicon loaded at startup (possibly empty)
    pub index: Arc<LexicalIndex>,
    pub orchestrator: Arc<CompletionOrchestrator>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        prompts: PromptsConfig,
        index: Arc<LexicalIndex>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let orchestrator = CompletionOrchestrator::from_settings(
            &settings,
            prompts,
            Arc::clone(&index),
            generator,
        );
        Self {
            settings: Arc::new(settings),
            index,
            orchestrator: Arc::new(orchestrator),
        }
    }
}
