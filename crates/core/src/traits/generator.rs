//! Text generation trait

use async_trait::async_trait;

use crate::Result;

/// Text generation interface
///
/// A black box from prompt to response text that may fail. The completion
/// orchestrator owns the retry policy; implementations should not retry on
/// their own unless configured to.
///
/// # Example
///
/// ```ignore
/// let generator: Arc<dyn TextGenerator> = Arc::new(GeneratorAdapter::new(gemini));
/// let answer = generator.generate("As a Fulfulde expert: hello?").await?;
/// ```
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    /// Generate a response for the given prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable and configured
    async fn is_available(&self) -> bool {
        true
    }

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.is_empty() {
                return Err(Error::Llm("empty prompt".to_string()));
            }
            Ok(format!("echo: {}", prompt))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_generator_object_safety() {
        let generator: Box<dyn TextGenerator> = Box::new(EchoGenerator);
        assert_eq!(generator.generate("hi").await.unwrap(), "echo: hi");
        assert!(generator.generate("").await.is_err());
        assert!(generator.is_available().await);
        assert_eq!(generator.model_name(), "echo");
    }
}
