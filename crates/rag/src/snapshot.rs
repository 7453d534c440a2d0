//! Lexicon snapshot loading
//!
//! The snapshot is a JSON or YAML document with index-aligned `embeddings`
//! and `metadata` arrays plus an opaque `model_info` object. It is read from
//! a local file when one is configured, otherwise fetched once from the
//! Hugging Face Hub.

use std::path::{Path, PathBuf};

use hf_hub::api::tokio::ApiBuilder;
use nerala_config::SnapshotConfig;
use serde::{Deserialize, Serialize};

use crate::index::LexicalIndex;
use crate::RagError;

fn default_category() -> String {
    "general".to_string()
}

/// One metadata record of the snapshot
///
/// `language` stays a plain string so records in unsupported languages can
/// be skipped instead of failing the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub phrase: String,
    pub translation: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub language: String,
}

/// Snapshot document format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    pub metadata: Vec<SnapshotRecord>,
    #[serde(default)]
    pub model_info: serde_json::Value,
}

impl Snapshot {
    /// Parse a snapshot, picking the format from the file extension
    pub fn parse(content: &str, path: &Path) -> Result<Self, RagError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "yaml" | "yml" => serde_yaml::from_str(content)
                .map_err(|e| RagError::Snapshot(format!("YAML parse error: {}", e))),
            _ => serde_json::from_str(content)
                .map_err(|e| RagError::Snapshot(format!("JSON parse error: {}", e))),
        }
    }
}

/// Loads the lexicon snapshot into a [`LexicalIndex`]
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Read and parse a local snapshot file
    pub async fn load_file(path: &Path) -> Result<Snapshot, RagError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RagError::Snapshot(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Snapshot::parse(&content, path)
    }

    /// Download the snapshot file from the Hugging Face Hub
    ///
    /// Returns the path of the cached copy.
    pub async fn fetch_from_hub(config: &SnapshotConfig) -> Result<PathBuf, RagError> {
        let mut builder = ApiBuilder::new()
            .with_progress(false)
            .with_token(config.hf_token.clone());
        if let Some(cache_dir) = &config.cache_dir {
            builder = builder.with_cache_dir(PathBuf::from(cache_dir));
        }

        let api = builder
            .build()
            .map_err(|e| RagError::Download(e.to_string()))?;

        tracing::info!(
            repo = %config.hf_repo_id,
            file = %config.hf_filename,
            "Fetching lexicon snapshot from Hugging Face Hub"
        );

        api.model(config.hf_repo_id.clone())
            .get(&config.hf_filename)
            .await
            .map_err(|e| {
                RagError::Download(format!(
                    "{}/{}: {}",
                    config.hf_repo_id, config.hf_filename, e
                ))
            })
    }

    /// Locate, parse and index the snapshot
    pub async fn load(config: &SnapshotConfig) -> Result<LexicalIndex, RagError> {
        let path = match &config.path {
            Some(path) => PathBuf::from(path),
            None if config.offline => {
                return Err(RagError::Snapshot(
                    "no local snapshot configured and hub download disabled".to_string(),
                ))
            },
            None => Self::fetch_from_hub(config).await?,
        };

        let snapshot = Self::load_file(&path).await?;
        tracing::debug!(
            path = %path.display(),
            records = snapshot.metadata.len(),
            vectors = snapshot.embeddings.len(),
            "Snapshot parsed"
        );
        LexicalIndex::from_snapshot(snapshot)
    }

    /// Like [`load`](Self::load), but any failure yields the empty index
    pub async fn load_or_empty(config: &SnapshotConfig) -> LexicalIndex {
        match Self::load(config).await {
            Ok(index) => index,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to load lexicon snapshot, continuing with an empty index"
                );
                LexicalIndex::empty()
            },
        }
    }
}
