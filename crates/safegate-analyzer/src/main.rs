//! SafeGate Analyzer
//!
//! Classifies HTTP request fragments (query strings, form fields, headers)
//! as SQL injection, XSS, path traversal or other attack payloads, using
//! either keyword heuristics or an Ollama-hosted language model.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tracing::{info, warn};

use safegate_analyzer::{create_router, AnalyzerConfig, AppState, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("Starting SafeGate Analyzer");

    let config = AnalyzerConfig::load(&cli)?;
    info!("Configuration loaded successfully");
    info!("Backend: {}", config.backend);
    info!("Default model: {}", config.model);
    info!("Request timeout: {}s", config.timeout_seconds);

    let metrics_handle = init_metrics()?;

    let addr = config.socket_addr()?;
    let state = AppState::new(config, Some(metrics_handle))?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Analyzer listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("safegate=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safegate=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and return the handle used by `/metrics`
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "safegate_classifications_total",
        "Classified payloads by decision path and category"
    );
    metrics::describe_counter!(
        "safegate_backend_failures_total",
        "Degraded or unclear backend answers by kind"
    );
    metrics::describe_counter!(
        "safegate_batch_payloads_total",
        "Payloads processed through batch analysis"
    );
    metrics::describe_counter!(
        "safegate_model_pulls_total",
        "Finished model pulls by outcome"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
