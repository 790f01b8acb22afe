//! Best-effort search logging and per-partner usage counting.

use crate::rest::DataApi;
use crate::telemetry;
use search::UsageLogEntry;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Where the background writes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTargets {
    pub log_table: String,
    pub usage_rpc: String,
}

/// Write `entry` to the search log and bump the partner's daily counter.
///
/// Both calls run concurrently on a detached task. Failures are logged and
/// counted, never returned, so callers may drop the handle.
pub fn spawn_usage_log(
    api: Arc<dyn DataApi>,
    targets: UsageTargets,
    entry: UsageLogEntry,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(row) = encode_or_report("search_log", &entry) else {
            return;
        };
        let increment = entry
            .usage_increment(chrono::Utc::now().date_naive())
            .and_then(|args| encode_or_report("usage_increment", &args));

        let log_call = api.insert_row(&targets.log_table, &row);
        let usage_call = async {
            match &increment {
                Some(args) => Some(api.call_rpc(&targets.usage_rpc, args).await),
                None => None,
            }
        };
        let (logged, counted) = tokio::join!(log_call, usage_call);

        if let Err(err) = logged {
            tracing::warn!(table = %targets.log_table, error = %err, "search_log_failed");
            telemetry::record_background_failure("search_log");
        }
        if let Some(Err(err)) = counted {
            tracing::warn!(
                rpc = %targets.usage_rpc,
                partner_id = ?entry.partner_id,
                error = %err,
                "usage_increment_failed"
            );
            telemetry::record_background_failure("usage_increment");
        }
    })
}

/// Encode one background payload, logging and counting a failure under `call`.
fn encode_or_report<T: Serialize>(call: &'static str, value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(call, error = %err, "usage_payload_encode_failed");
            telemetry::record_background_failure(call);
            None
        }
    }
}
