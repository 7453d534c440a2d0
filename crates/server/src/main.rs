//! Nerala RAG Server Entry Point

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use nerala_config::{load_settings, PromptsConfig, Settings};
use nerala_core::TextGenerator;
use nerala_llm::{GeminiBackend, GeminiConfig, GeneratorAdapter};
use nerala_rag::SnapshotLoader;
use nerala_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("NERALA_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized
            eprintln!(
                "Loaded configuration from files (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        },
        Err(e) if matches!(env.as_deref(), Some("staging" | "production")) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e.into());
        },
        Err(e) => {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!("Starting Nerala RAG Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let prompts = load_prompts(&config);

    let index = Arc::new(SnapshotLoader::load_or_empty(&config.snapshot).await);
    tracing::info!(
        entries = index.len(),
        dimension = index.dim(),
        languages = ?index.languages(),
        "Lexicon ready"
    );

    let backend = GeminiBackend::new(GeminiConfig::from(&config.generation))?;
    let generator: Arc<dyn TextGenerator> = Arc::new(GeneratorAdapter::new(backend));
    tracing::info!(model = generator.model_name(), "Text generator configured");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, prompts, index, generator);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Prompt templates, from the configured YAML file when there is one
fn load_prompts(config: &Settings) -> PromptsConfig {
    let Some(path) = config.prompts_path.as_deref() else {
        return PromptsConfig::default();
    };

    match PromptsConfig::load(path) {
        Ok(prompts) => {
            tracing::info!(path, "Loaded prompt templates");
            prompts
        },
        Err(e) => {
            tracing::warn!(
                path,
                error = %e,
                "Failed to load prompt templates, using built-in defaults"
            );
            PromptsConfig::default()
        },
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("nerala={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
