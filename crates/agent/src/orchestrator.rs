//! Completion orchestrator

use std::sync::Arc;

use nerala_config::{PromptsConfig, Settings};
use nerala_core::{CompletionResult, ContextItem, Language, TextGenerator};
use nerala_llm::PromptComposer;
use nerala_rag::{ContextAggregator, LexicalIndex, RetrievalConfig, TermExtractor};

/// Answers lexicon questions
///
/// `complete` never fails. A failed grounded generation is retried once
/// with the bare fallback prompt and no sources; if that fails too the
/// configured apology is returned.
pub struct CompletionOrchestrator {
    extractor: TermExtractor,
    aggregator: ContextAggregator,
    composer: PromptComposer,
    generator: Arc<dyn TextGenerator>,
}

impl CompletionOrchestrator {
    pub fn new(
        index: Arc<LexicalIndex>,
        retrieval: &RetrievalConfig,
        composer: PromptComposer,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            extractor: TermExtractor::new(retrieval.min_term_chars),
            aggregator: ContextAggregator::new(index, retrieval),
            composer,
            generator,
        }
    }

    /// Wire everything from loaded settings
    pub fn from_settings(
        settings: &Settings,
        prompts: PromptsConfig,
        index: Arc<LexicalIndex>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let retrieval = RetrievalConfig::from(&settings.rag);
        let composer = PromptComposer::new(prompts, settings.rag.context_render_limit);
        Self::new(index, &retrieval, composer, generator)
    }

    /// Context items that would ground an answer to `query`
    pub fn retrieve(
        &self,
        query: &str,
        language: Language,
        top_k: usize,
    ) -> (Vec<String>, Vec<ContextItem>) {
        let terms = self.extractor.extract(query);
        let context = self.aggregator.aggregate(query, &terms, language, top_k);
        (terms, context)
    }

    pub async fn complete(
        &self,
        query: &str,
        language: Language,
        top_k: usize,
    ) -> CompletionResult {
        let (terms, context) = self.retrieve(query, language, top_k);
        let prompt = self.composer.compose(query, language, &context, &terms);

        tracing::info!(
            language = %language,
            top_k,
            terms = terms.len(),
            context = context.len(),
            model = self.generator.model_name(),
            "Generating completion"
        );

        match self.generator.generate(&prompt).await {
            Ok(response) => {
                return CompletionResult {
                    response,
                    sources: context.into_iter().map(|c| c.phrase).collect(),
                    language,
                    query: query.to_string(),
                };
            },
            Err(e) => {
                tracing::error!(
                    language = %language,
                    error = %e,
                    "Grounded generation failed, retrying with fallback prompt"
                );
            },
        }

        let fallback = self.composer.fallback_prompt(query, language);
        let response = match self.generator.generate(&fallback).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(language = %language, error = %e, "Fallback generation failed");
                self.composer.apology().to_string()
            },
        };

        CompletionResult {
            response,
            sources: Vec::new(),
            language,
            query: query.to_string(),
        }
    }
}
