//! Text generator adapter
//!
//! Bridges the LlmBackend trait to the core TextGenerator trait, so the
//! orchestrator never depends on a concrete backend.

use std::sync::Arc;

use async_trait::async_trait;
use nerala_core::{Result, TextGenerator};

use crate::backend::LlmBackend;

/// Adapter that wraps an LlmBackend to implement the core TextGenerator trait.
///
/// # Example
///
/// ```ignore
/// let backend = GeminiBackend::new(GeminiConfig::from(&settings.generation))?;
/// let generator: Arc<dyn TextGenerator> = Arc::new(GeneratorAdapter::new(backend));
/// ```
pub struct GeneratorAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl GeneratorAdapter {
    /// Create a new adapter wrapping an LlmBackend
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend, model_name }
    }
}

#[async_trait]
impl TextGenerator for GeneratorAdapter {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let result = self.backend.generate(prompt).await?;
        Ok(result.text)
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use crate::LlmError;

    struct MockBackend {
        response: Option<String>,
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(&self, prompt: &str) -> std::result::Result<GenerationResult, LlmError> {
            match &self.response {
                Some(text) => Ok(GenerationResult {
                    text: format!("{} ({})", text, prompt.len()),
                    prompt_tokens: 3,
                    output_tokens: 2,
                    total_time_ms: 1,
                    finish_reason: FinishReason::Stop,
                }),
                None => Err(LlmError::Api("quota exceeded".to_string())),
            }
        }

        async fn is_available(&self) -> bool {
            self.response.is_some()
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn test_adapter_generate() {
        let adapter = GeneratorAdapter::new(MockBackend {
            response: Some("Jam".to_string()),
        });
        assert_eq!(adapter.generate("hello").await.unwrap(), "Jam (5)");
        assert!(adapter.is_available().await);
    }

    #[tokio::test]
    async fn test_adapter_maps_errors() {
        let adapter = GeneratorAdapter::new(MockBackend { response: None });
        let err = adapter.generate("hello").await.unwrap_err();
        assert!(matches!(err, nerala_core::Error::Llm(_)));
        assert!(!adapter.is_available().await);
    }

    #[test]
    fn test_adapter_model_name() {
        let adapter = GeneratorAdapter::new(MockBackend { response: None });
        assert_eq!(adapter.model_name(), "mock-model");
    }
}
