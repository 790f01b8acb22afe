//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, logging, compression, etc.)
//! - Graceful shutdown handling

use crate::auth::{optional_partner, require_partner};
use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, health, memorable, not_found, purchase};
use crate::state::ServerState;
use crate::telemetry::{self, PrometheusPipelineMetrics};
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /, /rest/v2, /health, /ready, /metrics
/// - Search: optional partner key, mandatory when configured
/// - Purchase: partner key always required for POST
///
/// Middleware stack (outermost first):
/// 1. Tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Partner authentication (per route)
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any)
    } else {
        CorsLayer::new()
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/rest/v2", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let search_routes = Router::new()
        .route(
            "/rest/v2/mobile/memorable",
            get(memorable::search_memorable),
        )
        .layer(from_fn_with_state(state.clone(), optional_partner));

    // GET answers 405 before any credential check
    let purchase_post = post(purchase::purchase_numbers)
        .route_layer(from_fn_with_state(state.clone(), require_partner));
    let purchase_routes = Router::new().route(
        "/rest/v2/mobile/memorable/purchase",
        get(purchase::purchase_usage).merge(purchase_post),
    );

    Router::new()
        .merge(public_routes)
        .merge(search_routes)
        .merge(purchase_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(state.config.timeout_secs),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the numbers HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// # Initialization
///
/// 1. Sets up structured JSON logging with the configured log level
/// 2. Installs the Prometheus recorder when metrics are enabled
/// 3. Creates shared server state (REST client, webhook, policies)
/// 4. Builds the Axum router and binds to the configured TCP address
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let metrics_handle = if config.metrics_enabled {
        let handle = telemetry::install_recorder();
        numbers_api::set_pipeline_metrics(Some(Arc::new(PrometheusPipelineMetrics)));
        handle
    } else {
        None
    };

    let state = ServerState::new(config.clone())?.with_metrics_handle(metrics_handle);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        addr = %addr,
        rest_base = %config.rest_base(),
        numbers_table = %config.numbers_table,
        "Starting numbers server"
    );
    tracing::info!(
        timeout_secs = config.timeout_secs,
        max_body_bytes = config.max_body_bytes,
        search_requires_api_key = config.search_requires_api_key,
        purchase_webhook = config.purchase_webhook_url.is_some(),
        "Request limits"
    );
    tracing::info!(
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        "Optional features"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
