//! Centralized constants for the Nerala backend
//!
//! Single source of truth for default values used across crates. Settings
//! defaults and component `Default` impls both read from here.

/// Retrieval defaults
pub mod rag {
    /// Number of context entries returned when the caller does not ask
    pub const DEFAULT_TOP_K: usize = 3;

    /// Upper bound accepted for `top_k`
    pub const MAX_TOP_K: usize = 10;

    /// Cosine similarity at or below this is "no meaningful match"
    pub const SIMILARITY_THRESHOLD: f32 = 0.1;

    /// Added to vector norms before dividing, so zero vectors stay finite
    pub const NORM_EPSILON: f32 = 1e-8;

    /// Context entries rendered into a prompt
    pub const CONTEXT_RENDER_LIMIT: usize = 5;

    /// Extracted terms shorter than this (in chars) are discarded
    pub const MIN_TERM_CHARS: usize = 2;

    /// Longest query accepted by the HTTP boundary (chars)
    pub const MAX_QUERY_CHARS: usize = 1000;
}

/// Lexicon snapshot defaults
pub mod snapshot {
    /// Hugging Face repository holding the published snapshot
    pub const HF_REPO_ID: &str = "nde-dilan/nerala-rag-model";

    /// File name of the snapshot inside the repository
    pub const HF_FILENAME: &str = "rag_snapshot.json";
}

/// Service endpoints
pub mod endpoints {
    /// Google Generative Language API
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com";

    /// Default Gemini model
    pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

    /// HTTP timeout for one generation call (seconds)
    pub const GEMINI_TIMEOUT_SECS: u64 = 30;
}

/// HTTP server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    pub const DEFAULT_PORT: u16 = 8000;

    pub const API_VERSION: &str = "v1";

    /// Maximum request body size (16 MiB)
    pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

    /// Request timeout (seconds). Covers the grounded and the fallback
    /// generation call back to back.
    pub const REQUEST_TIMEOUT_SECS: u64 = 75;
}
