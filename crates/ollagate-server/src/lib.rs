//! HTTP server assembly for ollagate
//!
//! Wires the LLM routes, `/health` and `/usage` behind the auth,
//! request-id and panic-catching layers.

#![allow(clippy::must_use_candidate)]

mod auth;
mod error;
mod health;
mod request_context;
mod request_id;
mod usage;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use http::StatusCode;
use ollagate_config::Config;
use ollagate_core::ErrorBody;
use ollagate_llm::LlmState;
use ollagate_telemetry::metrics::GatewayMetrics;
use ollagate_usage::UsageLedger;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub use auth::KeyStore;
pub use error::{AuthError, RouteError};
pub use request_id::X_REQUEST_ID;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    llm: LlmState,
}

impl Server {
    /// Build the server from configuration
    ///
    /// When `backend.verify_on_startup` is set, the backend model catalog
    /// is listed once and startup fails if the backend cannot be reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built or startup
    /// verification fails
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let ledger = UsageLedger::new();
        let state = LlmState::from_config(&config.backend, ledger)?;

        tracing::info!(backend = %config.backend.url, "using Ollama backend");

        if config.backend.verify_on_startup {
            verify_backend(&state).await?;
        }

        Ok(Self::with_state(&config, state))
    }

    /// Build the server around an existing LLM state
    pub fn with_state(config: &Config, state: LlmState) -> Self {
        Self {
            router: build_router(config, state.clone()),
            listen_address: config.server.listen_address,
            llm: state,
        }
    }

    /// Get the configured listen address
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered. Open streaming
    /// completions are ended when shutdown starts.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let llm = self.llm;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
                llm.shutdown_streams();
            })
            .await?;

        Ok(())
    }
}

async fn verify_backend(state: &LlmState) -> anyhow::Result<()> {
    let models = state
        .verify_backend()
        .await
        .map_err(|e| anyhow::anyhow!("backend verification failed: {e}"))?;

    if models.is_empty() {
        tracing::warn!("backend has no local models, pull one with `ollama pull`");
    }

    for model in &models {
        tracing::info!(model = %model, "backend model available");
    }

    Ok(())
}

fn build_router(config: &Config, state: LlmState) -> Router {
    let keys = Arc::new(KeyStore::from_config(&config.auth));
    let metrics = GatewayMetrics::new();

    let mut app = Router::new().route(
        "/usage",
        routing::get(usage::usage_handler).with_state(state.ledger().clone()),
    );

    if config.server.health.enabled {
        app = app.route(&config.server.health.path, routing::get(health::health_handler));
    }

    app = app
        .merge(ollagate_llm::llm_router(state))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed);

    // Innermost first
    app.layer(axum::middleware::from_fn(request_context::request_context_middleware))
        .layer(axum::middleware::from_fn(move |request, next| {
            let keys = Arc::clone(&keys);
            async move { auth::auth_middleware(keys, request, next).await }
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(axum::middleware::from_fn(move |request, next| {
            let metrics = metrics.clone();
            async move { request_id::request_id_middleware(metrics, request, next).await }
        }))
}

#[allow(clippy::needless_pass_by_value)]
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = message, "handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::internal())).into_response()
}
