//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener with graceful shutdown
//! - Dispatch requests to the decision engine
//! - Forward requests to the chosen destination

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ClientIpConfig, DestinationConfig, RouterConfig};
use crate::http::request::{IncomingRequest, MakeRequestUuid};
use crate::http::response::upstream_failure;
use crate::observability::metrics;
use crate::proxy::UpstreamClient;
use crate::routing::{DecisionEngine, Destination};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub upstream: UpstreamClient,
    pub destinations: Arc<DestinationConfig>,
    pub client_ip: Arc<ClientIpConfig>,
}

impl AppState {
    fn destination_url(&self, destination: Destination) -> &str {
        match destination {
            Destination::Primary => &self.destinations.primary,
            Destination::Decoy => &self.destinations.decoy,
        }
    }
}

/// HTTP server for the classifying proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server around a ready decision engine.
    pub fn new(config: &RouterConfig, engine: DecisionEngine) -> Result<Self, reqwest::Error> {
        let state = AppState {
            engine: Arc::new(engine),
            upstream: UpstreamClient::new(&config.upstream)?,
            destinations: Arc::new(config.destinations.clone()),
            client_ip: Arc::new(config.client_ip.clone()),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        // The id is set before the trace span opens and copied onto the
        // response on the way out.
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: decide, then stream the chosen destination's response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let (parts, body) = request.into_parts();
    let incoming = IncomingRequest::from_parts(&parts, peer, &state.client_ip);

    tracing::debug!(
        request_id = %incoming.request_id(),
        method = %incoming.method(),
        path = %incoming.uri().path(),
        "Classifying request"
    );

    let decision = state.engine.decide(&incoming).await;
    let destination = decision.destination;
    let url = state.destination_url(destination);

    match state.upstream.forward(url, &incoming, body).await {
        Ok(response) => {
            metrics::record_upstream(destination.as_str(), response.status().as_u16());
            metrics::record_duration(destination.as_str(), incoming.received_at());
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %incoming.request_id(),
                destination = %destination,
                url = %url,
                error = %e,
                "Upstream request failed"
            );
            metrics::record_upstream_failure(destination.as_str());
            metrics::record_duration(destination.as_str(), incoming.received_at());
            upstream_failure()
        }
    }
}
