//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{endpoints, rag, server, snapshot};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// Lexicon snapshot location
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Text generation backend
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Optional YAML file overriding the built-in prompt templates
    #[serde(default)]
    pub prompts_path: Option<String>,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_rag()?;
        self.validate_server()?;
        self.validate_generation()?;
        Ok(())
    }

    fn validate_rag(&self) -> Result<(), ConfigError> {
        let rag = &self.rag;

        if rag.max_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.max_top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.default_top_k == 0 || rag.default_top_k > rag.max_top_k {
            return Err(ConfigError::InvalidValue {
                field: "rag.default_top_k".to_string(),
                message: format!(
                    "Must be between 1 and max_top_k ({}), got {}",
                    rag.max_top_k, rag.default_top_k
                ),
            });
        }

        if !(-1.0..=1.0).contains(&rag.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "rag.similarity_threshold".to_string(),
                message: format!(
                    "Must be between -1.0 and 1.0, got {}",
                    rag.similarity_threshold
                ),
            });
        }

        if rag.norm_epsilon <= 0.0 || !rag.norm_epsilon.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "rag.norm_epsilon".to_string(),
                message: format!("Must be a positive number, got {}", rag.norm_epsilon),
            });
        }

        if rag.context_render_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.context_render_limit".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if rag.min_term_chars < rag::MIN_TERM_CHARS {
            return Err(ConfigError::InvalidValue {
                field: "rag.min_term_chars".to_string(),
                message: format!(
                    "Must be at least {}, got {}",
                    rag::MIN_TERM_CHARS,
                    rag.min_term_chars
                ),
            });
        }

        if rag.max_query_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rag.max_query_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        let budget = self.generation.worst_case_secs();
        if self.server.request_timeout_secs <= budget {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                message: format!(
                    "Must exceed the worst-case generation time of {}s (two calls of \
                     generation.timeout_secs with retries), got {}",
                    budget, self.server.request_timeout_secs
                ),
            });
        }

        if self.environment.is_production() && !self.server.cors_enabled {
            tracing::warn!("CORS is disabled in production - all origins will be allowed");
        }

        Ok(())
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        let has_key = self
            .generation
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false);

        if !has_key {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField("generation.api_key".to_string()));
            }
            tracing::warn!(
                "No Gemini API key configured (GEMINI_API_KEY); completions will use the apology response"
            );
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "generation.temperature".to_string(),
                message: format!(
                    "Must be between 0.0 and 2.0, got {}",
                    self.generation.temperature
                ),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// API version segment of the route prefix (`/api/{version}`)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Enable CORS restrictions
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    std::env::var("HOST").unwrap_or_else(|_| server::DEFAULT_HOST.to_string())
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

fn default_api_version() -> String {
    server::API_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    server::REQUEST_TIMEOUT_SECS
}

fn default_max_body_bytes() -> usize {
    server::MAX_BODY_BYTES
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    std::env::var("CORS_ORIGINS")
        .map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            cors_enabled: default_true(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// `top_k` used when a request does not specify one
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Largest `top_k` a request may ask for
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,

    /// Semantic matches must score strictly above this
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Epsilon added to norms during L2 normalization
    #[serde(default = "default_norm_epsilon")]
    pub norm_epsilon: f32,

    /// Minimum length (chars) of an extracted term
    #[serde(default = "default_min_term_chars")]
    pub min_term_chars: usize,

    /// Context entries rendered into the prompt
    #[serde(default = "default_context_render_limit")]
    pub context_render_limit: usize,

    /// Longest accepted query (chars)
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
}

fn default_top_k() -> usize {
    rag::DEFAULT_TOP_K
}

fn default_max_top_k() -> usize {
    rag::MAX_TOP_K
}

fn default_similarity_threshold() -> f32 {
    rag::SIMILARITY_THRESHOLD
}

fn default_norm_epsilon() -> f32 {
    rag::NORM_EPSILON
}

fn default_min_term_chars() -> usize {
    rag::MIN_TERM_CHARS
}

fn default_context_render_limit() -> usize {
    rag::CONTEXT_RENDER_LIMIT
}

fn default_max_query_chars() -> usize {
    rag::MAX_QUERY_CHARS
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            similarity_threshold: default_similarity_threshold(),
            norm_epsilon: default_norm_epsilon(),
            min_term_chars: default_min_term_chars(),
            context_render_limit: default_context_render_limit(),
            max_query_chars: default_max_query_chars(),
        }
    }
}

/// Lexicon snapshot location
///
/// A local `path` wins; otherwise the snapshot is fetched once from the
/// Hugging Face Hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Local snapshot file (JSON or YAML)
    #[serde(default)]
    pub path: Option<String>,

    /// Hugging Face repository id
    #[serde(default = "default_hf_repo_id")]
    pub hf_repo_id: String,

    /// Snapshot file name inside the repository
    #[serde(default = "default_hf_filename")]
    pub hf_filename: String,

    /// Access token for private repositories
    #[serde(default = "default_hf_token")]
    pub hf_token: Option<String>,

    /// Download cache directory (hf-hub default when unset)
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// Skip the Hub download entirely
    #[serde(default)]
    pub offline: bool,
}

fn default_hf_repo_id() -> String {
    std::env::var("HF_REPO_ID").unwrap_or_else(|_| snapshot::HF_REPO_ID.to_string())
}

fn default_hf_filename() -> String {
    snapshot::HF_FILENAME.to_string()
}

fn default_hf_token() -> Option<String> {
    std::env::var("HF_TOKEN").ok().filter(|t| !t.is_empty())
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: None,
            hf_repo_id: default_hf_repo_id(),
            hf_filename: default_hf_filename(),
            hf_token: default_hf_token(),
            cache_dir: None,
            offline: false,
        }
    }
}

/// Text generation (Gemini) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// API key
    #[serde(default = "default_gemini_api_key")]
    pub api_key: Option<String>,

    /// HTTP timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Backend-level retries for 5xx/network failures (0 = none)
    #[serde(default)]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds (doubles each retry)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_gemini_model() -> String {
    std::env::var("GEMINI_MODEL").unwrap_or_else(|_| endpoints::GEMINI_MODEL.to_string())
}

fn default_gemini_endpoint() -> String {
    endpoints::GEMINI_DEFAULT.to_string()
}

fn default_gemini_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_generation_timeout() -> u64 {
    endpoints::GEMINI_TIMEOUT_SECS
}

fn default_max_output_tokens() -> usize {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_initial_backoff_ms() -> u64 {
    200
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            endpoint: default_gemini_endpoint(),
            api_key: default_gemini_api_key(),
            timeout_secs: default_generation_timeout(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            max_retries: 0,
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl GenerationConfig {
    /// Longest a completion can spend generating, in seconds
    ///
    /// A completion makes at most two calls (grounded, then fallback), and
    /// each call may be retried `max_retries` times with doubling backoff.
    pub fn worst_case_secs(&self) -> u64 {
        let attempts = u64::from(self.max_retries) + 1;
        let backoff_ms: u64 = (0..self.max_retries)
            .map(|i| self.initial_backoff_ms.saturating_mul(1u64 << i.min(32)))
            .fold(0, u64::saturating_add);
        let per_call = self
            .timeout_secs
            .saturating_mul(attempts)
            .saturating_add(backoff_ms.div_ceil(1000));
        per_call.saturating_mul(2)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level for the nerala crates
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON logs
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from `config/` and the environment
///
/// Priority: env vars > config/{env}.* > config/default.* > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(config_dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = config_dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = config_dir.join(env_name);
        builder =
            builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("NERALA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn settings_with_key() -> Settings {
        let mut settings = Settings::default();
        settings.generation.api_key = Some("test-key".to_string());
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.rag.default_top_k, 3);
        assert_eq!(settings.rag.max_top_k, 10);
        assert_eq!(settings.server.api_version, "v1");
        assert_eq!(settings.environment, RuntimeEnvironment::Development);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = settings_with_key();
        assert!(settings.validate().is_ok());

        settings.rag.default_top_k = 11;
        assert!(settings.validate().is_err());

        settings.rag.default_top_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rag_validation_thresholds() {
        let mut settings = settings_with_key();

        settings.rag.similarity_threshold = 1.5;
        assert!(settings.validate_rag().is_err());
        settings.rag.similarity_threshold = 0.1;

        settings.rag.norm_epsilon = 0.0;
        assert!(settings.validate_rag().is_err());
        settings.rag.norm_epsilon = 1e-8;

        settings.rag.context_render_limit = 0;
        assert!(settings.validate_rag().is_err());
    }

    #[test]
    fn test_min_term_chars_below_two_rejected() {
        let mut settings = settings_with_key();
        settings.rag.min_term_chars = 1;
        assert!(matches!(
            settings.validate_rag(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "rag.min_term_chars"
        ));

        settings.rag.min_term_chars = 2;
        assert!(settings.validate_rag().is_ok());
    }

    #[test]
    fn test_generation_worst_case() {
        let mut generation = GenerationConfig::default();
        generation.timeout_secs = 30;
        assert_eq!(generation.worst_case_secs(), 60);

        generation.max_retries = 2;
        generation.initial_backoff_ms = 200;
        // 3 attempts of 30s plus 200ms + 400ms of backoff, rounded up, twice
        assert_eq!(generation.worst_case_secs(), 2 * (90 + 1));
    }

    #[test]
    fn test_request_timeout_must_cover_generation() {
        let mut settings = settings_with_key();
        assert!(settings.validate_server().is_ok());
        assert!(settings.server.request_timeout_secs > settings.generation.worst_case_secs());

        settings.server.request_timeout_secs = settings.generation.timeout_secs;
        match settings.validate_server() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "server.request_timeout_secs")
            },
            other => panic!("expected an invalid timeout, got {:?}", other),
        }

        settings.server.request_timeout_secs = 75;
        settings.generation.max_retries = 1;
        assert!(settings.validate_server().is_err());
    }

    #[test]
    fn test_missing_api_key_is_fatal_only_when_strict() {
        let mut settings = Settings::default();
        settings.generation.api_key = None;
        assert!(settings.validate_generation().is_ok());

        settings.environment = RuntimeEnvironment::Production;
        assert!(matches!(
            settings.validate_generation(),
            Err(ConfigError::MissingField(_))
        ));

        settings.generation.api_key = Some("key".to_string());
        assert!(settings.validate_generation().is_ok());
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.yaml"),
            "rag:\n  default_top_k: 5\n  similarity_threshold: 0.2\nserver:\n  port: 9100\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.rag.default_top_k, 5);
        assert!((settings.rag.similarity_threshold - 0.2).abs() < f32::EPSILON);
        assert_eq!(settings.server.port, 9100);
        // Untouched fields keep their defaults
        assert_eq!(settings.rag.max_top_k, 10);
    }

    #[test]
    fn test_env_file_overrides_default() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("default.yaml"), "rag:\n  default_top_k: 2\n").unwrap();
        std::fs::write(dir.path().join("staging.yaml"), "rag:\n  default_top_k: 4\n").unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.rag.default_top_k, 4);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("default.yaml"), "rag:\n  max_top_k: 0\n").unwrap();
        assert!(load_settings_from(dir.path(), None).is_err());
    }
}
