//! DocQA API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Configuration and store selection
//! - Logging and metrics set-up
//! - Serving the router with graceful shutdown

use docqa_common::{
    config::{AppConfig, ObservabilityConfig},
    db::{DbPool, Repository},
    inference::create_answerer,
    metrics::{self, INFERENCE_BUCKETS},
    InMemoryStore, OrganizationStore, SnapshotStore,
};
use docqa_gateway::{create_router, AppState};
use docqa_ingestion::Extractor;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config.observability);
    info!("Starting DocQA API Gateway v{}", docqa_common::VERSION);

    // Initialize metrics
    let metrics_handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("inference_duration_seconds".to_string()),
            INFERENCE_BUCKETS,
        )?
        .install_recorder()?;
    metrics::register_metrics();

    let (store, snapshots): (Arc<dyn OrganizationStore>, Arc<dyn SnapshotStore>) =
        if config.uses_memory_store() {
            info!("Using in-memory store");
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store)
        } else {
            let repository = Arc::new(Repository::new(DbPool::new(&config.database).await?));
            (repository.clone(), repository)
        };

    let answerer = create_answerer(&config.inference)?;
    let extractor = Arc::new(Extractor::from_config(&config.ingestion)?);
    info!(
        inference = answerer.name(),
        ocr = extractor.image_extractor(),
        "Collaborators ready"
    );

    // Create app state
    let state = AppState {
        config: config.clone(),
        store,
        snapshots,
        answerer,
        extractor,
        metrics: Some(metrics_handle),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level when set
fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
