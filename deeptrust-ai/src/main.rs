//! deeptrust-ai - forensic image analysis service
//!
//! Serves `POST /analyze-image` and `GET /health`. Configuration comes from an
//! optional TOML file plus `DEEPTRUST_API_KEY`; `--bind`/`--port` override the
//! listener.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use deeptrust_ai::config::{ConfigOverrides, TomlConfig};
use deeptrust_ai::services::{
    AnalysisPipeline, InferenceClient, InputNormalizer, PromptBuilder, RUBRIC_VERSION,
};
use deeptrust_ai::AppState;
use deeptrust_common::config::{resolve_api_key, ConfigResolver};

/// Command-line arguments for deeptrust-ai
#[derive(Parser, Debug)]
#[command(name = "deeptrust-ai")]
#[command(about = "Forensic AI-image detection service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "DEEPTRUST_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides [server].bind)
    #[arg(long, env = "DEEPTRUST_BIND")]
    bind: Option<String>,

    /// Port to listen on (overrides [server].port)
    #[arg(short, long, env = "DEEPTRUST_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("deeptrust-ai");
    let config: TomlConfig = resolver
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = config.apply_overrides(ConfigOverrides {
        bind: args.bind,
        port: args.port,
    });

    deeptrust_common::logging::init_tracing(&config.logging)
        .context("Failed to initialize logging")?;

    info!(
        "Starting deeptrust-ai v{} ({} {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        model = %config.inference.model,
        endpoint = %config.inference.endpoint,
        rubric = if config.inference.rubric_path.is_some() { "custom" } else { RUBRIC_VERSION },
        "Inference settings"
    );

    let api_key = resolve_api_key(config.inference.api_key.as_deref())
        .context("Inference API key not configured")?;
    let rubric = config.inference.load_rubric()?;

    let normalizer = InputNormalizer::new(&config.fetch)?;
    let client = InferenceClient::new(&config.inference, api_key)?;
    let pipeline = AnalysisPipeline::new(normalizer, PromptBuilder::new(rubric), Arc::new(client));

    let shutdown = CancellationToken::new();
    let state = AppState::new(pipeline, shutdown.clone(), config.server.max_body_bytes);
    let app = deeptrust_ai::build_router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM and cancels all in-flight analyses
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }

    shutdown.cancel();
}
