//! `GET /rest/v2/mobile/memorable`

use crate::auth::MaybePartner;
use crate::error::{ServerError, ServerResult};
use crate::rest::RowQuery;
use crate::routes::upstream_error;
use crate::state::ServerState;
use crate::telemetry;
use crate::usage::spawn_usage_log;
use axum::extract::{RawQuery, State};
use axum::http::header::{CONTENT_RANGE, REFERER};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use search::{RawSearchParams, SearchResult, UsageLogEntry};
use std::sync::Arc;

pub const SEARCH_FAILED: &str = "Search request failed. Please try again.";

/// Decode the query string. Repeated keys keep their first value.
fn search_params(query: Option<&str>) -> ServerResult<RawSearchParams> {
    let pairs: Vec<(String, String)> = serde_html_form::from_str(query.unwrap_or_default())
        .map_err(|err| ServerError::InvalidParams(vec![format!("query: {err}")]))?;
    Ok(RawSearchParams::from_pairs(pairs))
}

/// Search available memorable numbers.
///
/// Responds with the upstream rows and passes its `Content-Range` through
/// (empty when the data API sent none). The search is logged in the
/// background after the read succeeds.
pub async fn search_memorable(
    State(state): State<Arc<ServerState>>,
    partner: MaybePartner,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> ServerResult<Response> {
    let raw = search_params(query.as_deref())?;

    let plan = state.pipeline.plan(raw).map_err(|err| {
        telemetry::record_search("rejected");
        ServerError::from(err)
    })?;

    let row_query = RowQuery::new(state.config.numbers_table.clone())
        .param("select", "*")
        .param("and", plan.filters.and_expression())
        .with_range(plan.query.range)
        .with_count();

    let page = state.data_api.list_rows(&row_query).await.map_err(|err| {
        telemetry::record_search("upstream_failed");
        upstream_error("search", err, SEARCH_FAILED)
    })?;

    let result = SearchResult::from_upstream(page.rows, page.content_range);
    let source = headers.get(REFERER).and_then(|value| value.to_str().ok());
    let entry = UsageLogEntry::new(&plan.query, &result, partner.as_deref(), source);

    tracing::debug!(
        partner_id = ?partner.as_deref(),
        rows = result.rows.len(),
        total = ?result.total_count,
        "memorable_search_served"
    );
    // Detached: the response never waits for logging.
    drop(spawn_usage_log(
        state.data_api.clone(),
        state.usage_targets(),
        entry,
    ));
    telemetry::record_search("ok");

    let content_range = result.content_range.unwrap_or_default();
    Ok(([(CONTENT_RANGE, content_range)], Json(result.rows)).into_response())
}
