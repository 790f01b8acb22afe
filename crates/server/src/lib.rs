//! Numbers Server - HTTP gateway for memorable number search and purchase
//!
//! This crate fronts a PostgREST data API and a purchase webhook. It
//! supports:
//!
//! - **Search**: validated, filtered reads of available memorable numbers
//! - **Purchase**: availability-checked orders forwarded to a webhook
//! - **Usage logging**: background search logs and per-partner daily counts
//! - **Health & Metrics**: liveness/readiness probes and Prometheus metrics
//!
//! # Features
//!
//! - **Authentication**: partner API keys verified by hash through an RPC
//! - **Middleware**: compression, CORS, request ID tracking, structured logging
//! - **Configuration**: environment variables, an optional `server` file, and
//!   an optional YAML policy file
//! - **Error Handling**: one JSON error envelope with stable error codes
//! - **Graceful Shutdown**: Ctrl+C and SIGTERM
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints
//!
//! - `GET /`, `GET /rest/v2` - Resource index
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Partner Endpoints
//!
//! - `GET /rest/v2/mobile/memorable` - Search; `X-API-Key` optional unless
//!   `search_requires_api_key` is set
//! - `POST /rest/v2/mobile/memorable/purchase` - Purchase; `X-API-Key`
//!   required
//! - `GET /rest/v2/mobile/memorable/purchase` - 405 with usage help

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod usage;

pub use auth::PartnerIdentity;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use rest::{DataApi, PostgrestClient, RestError, RowPage, RowQuery, WebhookReply, WebhookSink};
pub use server::{build_router, start_server};
pub use state::ServerState;
pub use usage::spawn_usage_log;
