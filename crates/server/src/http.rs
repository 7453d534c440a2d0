//! HTTP Endpoints
//!
//! REST API for the lexicon assistant.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    routing::{get, post, MethodRouter},
    Router,
};
use nerala_config::RagConfig;
use nerala_core::{CompletionResult, Language};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let api_prefix = format!("/api/{}", server.api_version);
    let body_limit = server.max_body_bytes;
    let timeout = Duration::from_secs(server.request_timeout_secs);

    let api = Router::new()
        .route("/health", json_route(get(api_health)))
        .route("/rag/completion", json_route(post(rag_completion)))
        .route("/languages", json_route(get(languages)))
        .route("/debug/rag-components", json_route(get(debug_rag_components)));

    Router::new()
        .route("/health", json_route(get(health_check)))
        .nest(&api_prefix, api)
        .fallback(not_found)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Answer unsupported methods with a JSON body
fn json_route(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(method_not_allowed)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, allows any port on localhost and 127.0.0.1
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        tracing::info!("CORS configured to allow any origin");
        return layer.allow_origin(Any);
    }

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, allowing localhost on any port");
        return layer.allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            origin.to_str().map(is_local_origin).unwrap_or(false)
        }));
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    layer.allow_origin(parsed_origins)
}

/// `http(s)://localhost[:port]` or `http(s)://127.0.0.1[:port]`
fn is_local_origin(origin: &str) -> bool {
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    let port_ok = port.map_or(true, |p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));

    matches!(host, "localhost" | "127.0.0.1") && port_ok
}

/// Root health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "Nerala RAG Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// API health check
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "RAG Backend",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Completion request body
///
/// Everything is optional here so that missing or mistyped fields produce
/// the API's own error messages instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
struct CompletionRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    top_k: Option<serde_json::Value>,
}

/// Validated completion parameters
#[derive(Debug, PartialEq)]
struct CompletionParams {
    query: String,
    language: Language,
    top_k: usize,
}

fn validate_request(
    request: CompletionRequest,
    rag: &RagConfig,
) -> Result<CompletionParams, ServerError> {
    let (Some(query), Some(language)) = (request.query, request.language) else {
        return Err(ServerError::InvalidRequest(
            "Missing required fields: query, language".to_string(),
        ));
    };

    if query.trim().is_empty() {
        return Err(ServerError::InvalidRequest("Query cannot be empty".to_string()));
    }

    if query.chars().count() > rag.max_query_chars {
        return Err(ServerError::InvalidRequest(format!(
            "Query must be at most {} characters",
            rag.max_query_chars
        )));
    }

    let language = language
        .parse::<Language>()
        .map_err(|_| ServerError::UnsupportedLanguage(language.clone()))?;

    let top_k = match request.top_k {
        None | Some(serde_json::Value::Null) => rag.default_top_k,
        Some(value) => value
            .as_u64()
            .and_then(|k| usize::try_from(k).ok())
            .filter(|k| (1..=rag.max_top_k).contains(k))
            .ok_or_else(|| {
                ServerError::InvalidRequest(format!(
                    "top_k must be between 1 and {}",
                    rag.max_top_k
                ))
            })?,
    };

    Ok(CompletionParams {
        query,
        language,
        top_k,
    })
}

/// Core RAG completion endpoint
async fn rag_completion(
    State(state): State<AppState>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<Json<CompletionResult>, ServerError> {
    let Json(request) = payload.map_err(reject_body)?;

    let params = validate_request(request, &state.settings.rag)?;
    let result = state
        .orchestrator
        .complete(&params.query, params.language, params.top_k)
        .await;

    Ok(Json(result))
}

fn reject_body(rejection: JsonRejection) -> ServerError {
    tracing::debug!(error = %rejection, "Rejected completion body");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => ServerError::UnsupportedMediaType,
        JsonRejection::JsonSyntaxError(_) => {
            ServerError::InvalidRequest("Request body is not valid JSON".to_string())
        },
        JsonRejection::JsonDataError(e) => {
            ServerError::InvalidRequest(format!("Invalid request body: {}", e.body_text()))
        },
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => ServerError::PayloadTooLarge,
        other => ServerError::InvalidRequest(other.body_text()),
    }
}

/// Supported languages and top-k bounds
async fn languages(State(state): State<AppState>) -> Json<serde_json::Value> {
    let rag = &state.settings.rag;
    Json(serde_json::json!({
        "languages": Language::all().iter().map(|l| l.as_str()).collect::<Vec<_>>(),
        "default_top_k": rag.default_top_k,
        "max_top_k": rag.max_top_k,
    }))
}

/// Lexicon load status
async fn debug_rag_components(State(state): State<AppState>) -> Json<serde_json::Value> {
    let index = &state.index;
    let loaded = !index.is_empty();
    Json(serde_json::json!({
        "rag_components_loaded": loaded,
        "has_metadata": loaded,
        "metadata_count": index.len(),
        "has_vectors": index.has_vectors(),
        "dimension": index.dim(),
        "supported_languages": index.languages().iter().map(|l| l.as_str()).collect::<Vec<_>>(),
    }))
}

async fn not_found() -> ServerError {
    ServerError::NotFound
}

async fn method_not_allowed() -> ServerError {
    ServerError::MethodNotAllowed
}
