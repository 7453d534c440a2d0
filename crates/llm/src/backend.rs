//! LLM backend implementations
//!
//! Gemini over its REST `generateContent` endpoint. Transient failures
//! (5xx, network, timeout) can be retried with exponential backoff; retries
//! are off by default since the orchestrator already degrades on failure.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::LlmError;

/// Gemini configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Model name, e.g. `gemini-2.0-flash`
    pub model: String,
    /// API base URL
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Maximum tokens to generate
    pub max_output_tokens: usize,
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::from(&nerala_config::GenerationConfig::default())
    }
}

impl From<&nerala_config::GenerationConfig> for GeminiConfig {
    fn from(config: &nerala_config::GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    pub prompt_tokens: usize,
    pub output_tokens: usize,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Safety,
    Other,
}

impl FinishReason {
    fn from_gemini(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") | None => Self::Stop,
            Some("MAX_TOKENS") => Self::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => Self::Safety,
            Some(_) => Self::Other,
        }
    }
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response for a single-turn prompt
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, LlmError>;

    /// Check if the backend can serve requests
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

// Wire types for generateContent

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate
    fn into_result(self, total_time_ms: u64) -> Result<GenerationResult, LlmError> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no candidates".to_string()))?;

        let finish_reason = FinishReason::from_gemini(candidate.finish_reason.as_deref());
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse(format!(
                "empty candidate text (finish reason {:?})",
                finish_reason
            )));
        }

        let (prompt_tokens, output_tokens) = self
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(GenerationResult {
            text,
            prompt_tokens,
            output_tokens,
            total_time_ms,
            finish_reason,
        })
    }
}

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// Execute a single request (used by retry logic)
    async fn execute_request(
        &self,
        api_key: &str,
        request: &GeminiRequest<'_>,
    ) -> Result<GeminiResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            // 5xx errors are retryable, 4xx are not
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(format!("{}: {}", status, error)));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Configuration("Gemini API key is not set".to_string()))?;

        let start = Instant::now();
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        // Retry loop with exponential backoff
        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "Gemini request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.config.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(api_key, &request).await {
                Ok(response) => {
                    let result = response.into_result(start.elapsed().as_millis() as u64)?;
                    tracing::debug!(
                        model = %self.config.model,
                        prompt_tokens = result.prompt_tokens,
                        output_tokens = result.output_tokens,
                        total_time_ms = result.total_time_ms,
                        "Gemini generation complete"
                    );
                    return Ok(result);
                },
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                },
                Err(e) => {
                    return Err(e);
                },
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
    }

    async fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeminiConfig {
        GeminiConfig {
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: Some("test-key".to_string()),
            max_output_tokens: 256,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            initial_backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_api_url() {
        let backend = GeminiBackend::new(config()).unwrap();
        assert_eq!(
            backend.api_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: "hello" }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.5,
                max_output_tokens: 100,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
    }

    #[test]
    fn test_response_text_concatenated() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"parts": [{"text": "Jam "}, {"text": "means hello."}], "role": "model"},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
            }"#,
        )
        .unwrap();

        let result = response.into_result(7).unwrap();
        assert_eq!(result.text, "Jam means hello.");
        assert_eq!(result.prompt_tokens, 12);
        assert_eq!(result.output_tokens, 4);
        assert_eq!(result.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(matches!(
            response.into_result(0),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_blocked_candidate_is_invalid() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert!(response.into_result(0).is_err());
    }

    #[test]
    fn test_is_retryable() {
        assert!(GeminiBackend::is_retryable(&LlmError::Network("x".into())));
        assert!(GeminiBackend::is_retryable(&LlmError::Timeout));
        assert!(!GeminiBackend::is_retryable(&LlmError::Api("400".into())));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let mut cfg = config();
        cfg.api_key = None;
        let backend = GeminiBackend::new(cfg).unwrap();
        assert!(!backend.is_available().await);
        assert!(matches!(
            backend.generate("hi").await,
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = nerala_config::GenerationConfig::default();
        settings.endpoint = "http://localhost:9999/".to_string();
        settings.api_key = Some("  ".to_string());
        settings.timeout_secs = 12;
        let cfg = GeminiConfig::from(&settings);
        assert_eq!(cfg.endpoint, "http://localhost:9999");
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.timeout, Duration::from_secs(12));
    }
}
