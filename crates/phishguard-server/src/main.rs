//! PhishGuard
//!
//! HTTP service that scores URLs with the probability of being a phishing
//! link, using a pretrained BERT sequence classifier.

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use phishguard_classifier::{download_artifacts, ModelLoader};
use phishguard_server::{create_router, AppState, Cli, Commands, DownloadArgs, ServeArgs, ServerConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.into_command() {
        Commands::Serve(args) => serve(args).await,
        Commands::Download(args) => download(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.verbose);

    info!("Starting PhishGuard");

    let mut config = ServerConfig::load(&args.config)?;
    config.apply_overrides(&args);
    config.validate()?;
    info!("Model path: {}", config.model.model_path.display());
    info!("Allowed origins: {:?}", config.cors.allowed_origins);

    let metrics_handle = init_metrics()?;

    // Loading mmaps the weights and may probe a GPU; keep it off the async workers
    let model_config = config.model.clone();
    let loader = tokio::task::spawn_blocking(move || ModelLoader::initialize(model_config))
        .await
        .context("model loading task failed")?
        .context("failed to load model, refusing to serve")?;

    let state = AppState::new(Arc::new(loader)).with_metrics(metrics_handle);
    let app = create_router(state, &config.cors)?;

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn download(args: DownloadArgs) -> Result<()> {
    init_tracing(args.verbose);

    let DownloadArgs {
        repo,
        revision,
        dest,
        ..
    } = args;

    let written =
        tokio::task::spawn_blocking(move || download_artifacts(&repo, &revision, &dest))
            .await
            .context("download task failed")??;

    for path in &written {
        info!("Wrote {}", path.display());
    }
    info!("Model downloaded successfully, run `phishguard serve` to start the server");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received, stopping server...");
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("phishguard=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phishguard=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "phishguard_predictions_total",
        "Successful predictions by class"
    );
    metrics::describe_counter!(
        "phishguard_prediction_failures_total",
        "Predictions that failed during tokenization or inference"
    );
    metrics::describe_counter!(
        "phishguard_malformed_requests_total",
        "Requests rejected before reaching the model"
    );
    metrics::describe_histogram!(
        "phishguard_inference_latency_us",
        metrics::Unit::Microseconds,
        "Tokenization plus forward pass latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
