//! API route handlers
//!
//! - `health`: liveness, readiness, and metrics
//! - `memorable`: memorable number search
//! - `purchase`: partner purchases of memorable numbers

pub mod health;
pub mod memorable;
pub mod purchase;

use crate::error::ServerError;
use axum::http::Uri;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Resource index for `/` and `/rest/v2`
///
/// # Response
///
/// ```json
/// {
///   "status": "info",
///   "message": "Please select a resource.",
///   "help": {
///     "availableResources": ["mobile"],
///     "example": "/rest/v2/mobile/memorable"
///   }
/// }
/// ```
pub async fn api_info(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_end_matches('/');
    let base = if path.is_empty() { "/rest/v2" } else { path };

    Json(json!({
        "status": "info",
        "message": "Please select a resource.",
        "version": env!("CARGO_PKG_VERSION"),
        "help": {
            "availableResources": ["mobile"],
            "example": format!("{base}/mobile/memorable"),
            "endpoints": [
                "/rest/v2/mobile/memorable",
                "/rest/v2/mobile/memorable/purchase",
                "/health",
                "/ready",
                "/metrics"
            ]
        }
    }))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// Log an outbound failure and turn it into a caller-safe error.
///
/// Transport and status failures become 502 with `message`; a body that
/// could not be decoded is a 500.
pub(crate) fn upstream_error(
    call: &'static str,
    err: crate::rest::RestError,
    message: &str,
) -> ServerError {
    crate::telemetry::record_upstream_failure(call);
    match err {
        crate::rest::RestError::Decode(detail) => ServerError::Internal(format!("{call}: {detail}")),
        other => {
            tracing::error!(call, error = %other, "upstream_failed");
            ServerError::BadGateway(message.to_string())
        }
    }
}
