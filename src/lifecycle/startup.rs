//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the reputation dataset and start its watcher
//! - Start the metrics endpoint
//! - Build the decision engine and HTTP server
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast on bad destinations, bind or metrics errors
//! - The reputation dataset fails open to an empty store
//! - Listener binds last, so traffic arrives only once everything is ready

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::RouterConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::reputation::{load_or_empty, DatasetWatcher, ReputationHandle};
use crate::routing::DecisionEngine;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Bring every subsystem up and serve until SIGINT or SIGTERM.
pub async fn run(config: RouterConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let reputation = ReputationHandle::new(if config.reputation.enabled {
        load_or_empty(config.reputation.path.as_deref())
    } else {
        Default::default()
    });

    // Dropping the watcher stops it, so it lives as long as `run`.
    let _watcher = match (&config.reputation.path, config.reputation.watch) {
        (Some(path), true) if config.reputation.enabled => {
            match DatasetWatcher::new(path, reputation.clone()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to watch reputation dataset, reload disabled");
                    None
                }
            }
        }
        _ => None,
    };

    let geo_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.geo.timeout_ms))
        .build()?;
    let engine = DecisionEngine::from_config(&config, reputation, geo_client);

    tracing::info!(
        policy = engine.policy_name(),
        primary = %config.destinations.primary,
        decoy = %config.destinations.decoy,
        delay_min_ms = config.policy.delay_min_ms,
        delay_max_ms = config.policy.delay_max_ms,
        geo_enabled = config.geo.enabled,
        "Decision engine ready"
    );

    let server = HttpServer::new(&config, engine)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, signal).await.map_err(StartupError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
