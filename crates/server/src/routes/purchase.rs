//! `POST /rest/v2/mobile/memorable/purchase`

use crate::auth::MaybePartner;
use crate::error::{ServerError, ServerResult};
use crate::rest::RowQuery;
use crate::routes::upstream_error;
use crate::state::ServerState;
use crate::telemetry;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use numbers_api::plan_purchase;
use purchase::{
    availability_filters, parse_body, reconcile, webhook_message, AvailableNumber, Confirmation,
    PurchaseRequest, Reconciliation, WebhookPayload, LOOKUP_COLUMNS,
};
use std::sync::Arc;

pub const LOOKUP_FAILED: &str = "Unable to verify numbers. Please try again.";
pub const WEBHOOK_FAILED: &str = "Purchase request could not be completed. Please try again.";
pub const USAGE: &str = "Use POST with Content-Type: application/json (body: partnerId, email?, items: [{ number, provision }]) or application/x-www-form-urlencoded (e.g. partnerId=…&items.number[0]=…&items.provision[0]=…).";

/// `GET` is not supported on the purchase resource.
pub async fn purchase_usage() -> ServerError {
    ServerError::MethodNotAllowed(USAGE.to_string())
}

/// Buy one or more memorable numbers for the authenticated partner.
///
/// The order is checked against live availability before it is forwarded
/// to the purchase webhook, whose reply is relayed with its own status.
pub async fn purchase_numbers(
    State(state): State<Arc<ServerState>>,
    partner: MaybePartner,
    request: Request,
) -> ServerResult<Response> {
    let partner = partner.0.ok_or(ServerError::MissingApiKey)?;
    let limit = state.purchase_policy.max_body_bytes;

    let declared_len = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    if declared_len.is_some_and(|len| len > limit) {
        telemetry::record_purchase("rejected");
        return Err(payload_too_large(limit));
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let query = request.uri().query().map(str::to_string);
    let body = to_bytes(request.into_body(), usize::try_from(limit).unwrap_or(usize::MAX))
        .await
        .map_err(|_| payload_too_large(limit))?;

    let order = parse_body(content_type.as_deref(), &body, query.as_deref())
        .map_err(ServerError::from)
        .and_then(|raw| {
            plan_purchase(raw, partner.as_str(), &state.purchase_policy).map_err(ServerError::from)
        })
        .inspect_err(|_| telemetry::record_purchase("rejected"))?;

    let Some(webhook) = state.webhook.clone() else {
        telemetry::record_purchase("not_configured");
        return Err(ServerError::ServiceUnavailable(
            "Purchase webhook not configured".to_string(),
        ));
    };

    let rows = lookup_available(&state, &order).await.inspect_err(|_| {
        telemetry::record_purchase("upstream_failed");
    })?;

    let priced = match reconcile(&order, rows) {
        Reconciliation::Unavailable(report) => {
            let outcome = if report.available.is_empty() {
                "unavailable"
            } else {
                "partially_available"
            };
            telemetry::record_purchase(outcome);
            tracing::info!(
                partner_id = %order.partner_id,
                unavailable = report.unavailable.len(),
                status = report.status,
                "purchase_unavailable"
            );
            let status = StatusCode::from_u16(report.status).unwrap_or(StatusCode::CONFLICT);
            return Ok((status, Json(report)).into_response());
        }
        Reconciliation::Available(priced) => priced,
    };

    let payload = WebhookPayload::new(&order, &priced);
    let reply = webhook.deliver(&payload).await.map_err(|err| {
        telemetry::record_purchase("upstream_failed");
        upstream_error("purchase_webhook", err, WEBHOOK_FAILED)
    })?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let message = webhook_message(reply.content_type.as_deref(), &reply.body);
    let confirmation = Confirmation::new(reply.status, message, &priced);

    if status.is_success() {
        telemetry::record_purchase("accepted");
        tracing::info!(
            partner_id = %order.partner_id,
            numbers = priced.len(),
            status = reply.status,
            "purchase_forwarded"
        );
    } else {
        telemetry::record_purchase("webhook_rejected");
        tracing::warn!(
            partner_id = %order.partner_id,
            status = reply.status,
            "purchase_webhook_rejected"
        );
    }

    Ok((status, Json(confirmation)).into_response())
}

async fn lookup_available(
    state: &ServerState,
    order: &PurchaseRequest,
) -> ServerResult<Vec<AvailableNumber>> {
    let mut query = RowQuery::new(state.config.numbers_table.clone());
    for filter in availability_filters(order) {
        let (column, expression) = filter.to_query_pair();
        query = query.param(column, expression);
    }
    let query = query.param("select", LOOKUP_COLUMNS);

    let page = state
        .data_api
        .list_rows(&query)
        .await
        .map_err(|err| upstream_error("purchase_lookup", err, LOOKUP_FAILED))?;

    page.rows
        .into_iter()
        .map(serde_json::from_value::<AvailableNumber>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ServerError::Internal(format!("lookup row: {err}")))
}

fn payload_too_large(limit: u64) -> ServerError {
    ServerError::PayloadTooLarge(format!(
        "Request body exceeds the maximum of {limit} bytes."
    ))
}
