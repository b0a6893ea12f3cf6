//! Message Fraud Detector - Main Entry Point
//!
//! Resolves and loads the model artifact, then serves predictions over HTTP.
//! Any failure before the listener is bound aborts the process.

use anyhow::Result;
use message_fraud_detector::{config::AppConfig, metrics::MetricsReporter, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "message_fraud_detector={level},tower_http={level}"
                ))
            }),
        )
        .init();

    info!("Starting Message Fraud Detector");
    info!(
        port = config.port,
        debug = config.debug,
        model_path = %config.model_path,
        remote_source = config.model_url.is_some(),
        "Configuration loaded"
    );

    // Resolve and load the model before accepting any request
    let state = server::bootstrap(&config).await?;
    let metrics = state.metrics.clone();

    if config.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    let app = server::router(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
