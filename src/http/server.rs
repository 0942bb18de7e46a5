//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every edge handler
//! - Wire up middleware (request ID, tracing, CORS, metrics, timeout, auth, body limit)
//! - Serve until the shutdown signal fires, then drain in-flight requests

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderName, Request},
    middleware, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::auth_context_middleware;
use crate::config::{GatewayConfig, ListenerConfig};
use crate::http::handlers;
use crate::http::middleware::{record_metrics, request_timeout};
use crate::upstream::Upstreams;

const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstreams: Arc<Upstreams>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server over already-wired upstreams.
    pub fn new(config: GatewayConfig, upstreams: Upstreams) -> Self {
        let state = AppState {
            upstreams: Arc::new(upstreams),
        };
        let router = Self::build_router(&config.listener, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: the request ID exists before tracing and
    /// before the auth context captures forwardable headers, and the timeout
    /// wraps the auth middleware so that expiry cancels the request context.
    pub fn build_router(config: &ListenerConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .merge(handlers::routes())
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(middleware::from_fn(auth_context_middleware))
            .layer(middleware::from_fn_with_state(config.request_timeout(), request_timeout))
            .layer(middleware::from_fn(record_metrics))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id
                )
            }))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// The fully layered router, for in-process serving.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.listener.request_timeout_secs,
            max_body_bytes = self.config.listener.max_body_bytes,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
