//! senti-worker - Sentiment queue worker
//!
//! Loads the configured sentiment models once, then polls the job queue at a
//! fixed interval until Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use senti_common::config::{ConfigOverrides, ConfigResolver};
use senti_common::logging::init_tracing;
use senti_worker::models::load_registry;
use senti_worker::{PipelineConfig, QueueClient, SentimentPipeline, Worker};
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Command-line arguments for senti-worker
#[derive(Parser, Debug)]
#[command(name = "senti-worker")]
#[command(about = "Sentiment analysis queue worker")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "SENTI_CONFIG")]
    config: Option<PathBuf>,

    /// Job queue endpoint
    #[arg(long, env = "SENTI_QUEUE_ENDPOINT")]
    endpoint: Option<String>,

    /// Sleep between polls in milliseconds
    #[arg(long, env = "SENTI_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Word budget per inference batch
    #[arg(long, env = "SENTI_MAX_WORDS")]
    max_words: Option<usize>,

    /// Log level or filter directive (RUST_LOG still wins)
    #[arg(long, env = "SENTI_LOG_LEVEL")]
    log_level: Option<String>,

    /// HuggingFace access token for gated or private models
    #[arg(long, env = "HF_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            poll_interval_ms: self.poll_interval_ms,
            max_words: self.max_words,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new("senti-worker");
    let (mut config, source) = resolver
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(&args.overrides());
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.logging).context("Failed to initialize logging")?;
    resolver.report(&source);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        build_profile = env!("BUILD_PROFILE"),
        "Starting senti-worker"
    );
    info!(
        endpoint = %config.queue.endpoint,
        max_words = config.pipeline.max_words,
        chunk_failure_policy = %config.pipeline.chunk_failure_policy,
        "Configuration resolved"
    );

    // Listen before the first cycle so a signal during it is not fatal
    let shutdown = shutdown_signal().context("Failed to install signal handlers")?;

    // Model download and weight loading block
    let registry = {
        let config = config.clone();
        let hf_token = args.hf_token.clone();
        tokio::task::spawn_blocking(move || load_registry(&config, hf_token))
            .await
            .context("Model loading task panicked")?
            .context("Failed to load sentiment models")?
    };
    info!(languages = ?registry.languages(), "Model registry ready");

    let pipeline = SentimentPipeline::new(
        Arc::new(registry),
        PipelineConfig::from(&config.pipeline),
    );
    let client =
        QueueClient::from_config(&config.queue).context("Failed to create queue client")?;
    let worker = Worker::new(
        client,
        pipeline,
        config.queue.poll_interval(),
        config.pipeline.default_language.clone(),
    );

    worker
        .run(async {
            let _ = shutdown.await;
        })
        .await;

    info!("senti-worker shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Handlers are registered on call; the returned receiver fires on the first
/// Ctrl+C or SIGTERM.
fn shutdown_signal() -> Result<oneshot::Receiver<()>> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = terminate.recv();

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => warn!(error = %e, "Ctrl+C handler failed, shutting down"),
            },
            _ = terminate => {
                info!("Received terminate signal, shutting down");
            },
        }
        let _ = tx.send(());
    });
    Ok(rx)
}
