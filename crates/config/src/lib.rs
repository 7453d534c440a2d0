//! Configuration management for the Nerala RAG backend
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (NERALA_ prefix, `__` separator)
//! - The plain variables the service has always honoured
//!   (GEMINI_API_KEY, GEMINI_MODEL, HF_REPO_ID, HF_TOKEN, CORS_ORIGINS, HOST, PORT)
//!
//! Prompt personas and instruction texts live in [`PromptsConfig`], which
//! ships with built-in defaults and can be overridden from a YAML file.

pub mod constants;
pub mod prompts;
pub mod settings;

pub use prompts::{PromptsConfig, PromptsConfigError};
pub use settings::{
    load_settings, load_settings_from, GenerationConfig, ObservabilityConfig, RagConfig,
    RuntimeEnvironment, ServerConfig, Settings, SnapshotConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for nerala_core::Error {
    fn from(err: ConfigError) -> Self {
        nerala_core::Error::Config(err.to_string())
    }
}
