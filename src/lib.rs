//! Workspace umbrella crate for the memorable numbers gateway.
//!
//! This crate stitches together the search and purchase stages so callers
//! can plan a request with a single entry point, and lets an observer time
//! each run.

pub mod config;

pub use purchase::{
    availability_filters, parse_body, prepare_purchase, reconcile, webhook_message,
    AvailableNumber, Confirmation, ParseError, PricedItem, Provision, PurchaseError,
    PurchaseItem, PurchasePolicy, PurchaseRequest, RawPurchase, Reconciliation,
    UnavailableReport, WebhookPayload, LOOKUP_COLUMNS,
};
pub use search::{
    build_filters, normalize, prepare, validate, ContentRange, Filter, FilterOp, FilterSet,
    IndexRange, MatchMode, PolicyError, RawSearchParams, SearchPlan, SearchPolicy, SearchQuery,
    SearchResult, SearchTerm, SearchType, UsageIncrement, UsageLogEntry, ValidationErrors,
    Violation,
};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that can occur while planning a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Policy(PolicyError),
    Validation(ValidationErrors),
    Purchase(PurchaseError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Policy(err) => write!(f, "invalid search policy: {err}"),
            PipelineError::Validation(err) => write!(f, "{err}"),
            PipelineError::Purchase(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Policy(err) => Some(err),
            PipelineError::Validation(err) => Some(err),
            PipelineError::Purchase(err) => Some(err),
        }
    }
}

impl From<PolicyError> for PipelineError {
    fn from(value: PolicyError) -> Self {
        PipelineError::Policy(value)
    }
}

impl From<ValidationErrors> for PipelineError {
    fn from(value: ValidationErrors) -> Self {
        PipelineError::Validation(value)
    }
}

impl From<PurchaseError> for PipelineError {
    fn from(value: PurchaseError) -> Self {
        PipelineError::Purchase(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_search(&self, latency: Duration, result: Result<(), ValidationErrors>);
    fn record_purchase(&self, latency: Duration, result: Result<(), PurchaseError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_search(self, result: Result<(), ValidationErrors>) {
        self.recorder.record_search(self.start.elapsed(), result);
    }

    fn record_purchase(self, result: Result<(), PurchaseError>) {
        self.recorder.record_purchase(self.start.elapsed(), result);
    }
}

/// Search planning bound to one checked [`SearchPolicy`].
#[derive(Debug, Clone, Default)]
pub struct SearchPipeline {
    policy: SearchPolicy,
}

impl SearchPipeline {
    /// Fails when the policy's limits are inconsistent.
    pub fn new(policy: SearchPolicy) -> Result<Self, PipelineError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Normalize, validate, and build filters for one request.
    pub fn plan(&self, raw: RawSearchParams) -> Result<SearchPlan, PipelineError> {
        plan_search(raw, &self.policy)
    }
}

/// Plan a search with an explicit policy.
pub fn plan_search(raw: RawSearchParams, policy: &SearchPolicy) -> Result<SearchPlan, PipelineError> {
    let span = MetricsSpan::start();
    let result = prepare(raw, policy);
    if let Some(span) = span {
        span.record_search(result.as_ref().map(|_| ()).map_err(|err| err.clone()));
    }
    Ok(result?)
}

/// Check a parsed purchase for `partner` and de-duplicate its items.
pub fn plan_purchase(
    raw: RawPurchase,
    partner: &str,
    policy: &PurchasePolicy,
) -> Result<PurchaseRequest, PipelineError> {
    let span = MetricsSpan::start();
    let result = prepare_purchase(raw, partner, policy);
    if let Some(span) = span {
        span.record_purchase(result.as_ref().map(|_| ()).map_err(|err| err.clone()));
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct CountingMetrics {
        events: RwLock<Vec<&'static str>>,
    }

    impl CountingMetrics {
        fn snapshot(&self) -> Vec<&'static str> {
            self.events.read().unwrap().clone()
        }
    }

    impl PipelineMetrics for CountingMetrics {
        fn record_search(&self, _latency: Duration, result: Result<(), ValidationErrors>) {
            let label = if result.is_ok() {
                "search_ok"
            } else {
                "search_err"
            };
            self.events.write().unwrap().push(label);
        }

        fn record_purchase(&self, _latency: Duration, result: Result<(), PurchaseError>) {
            let label = if result.is_ok() {
                "purchase_ok"
            } else {
                "purchase_err"
            };
            self.events.write().unwrap().push(label);
        }
    }

    #[test]
    fn pipeline_rejects_inconsistent_policy() {
        let policy = SearchPolicy {
            max_search_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            SearchPipeline::new(policy),
            Err(PipelineError::Policy(_))
        ));
    }

    #[test]
    fn pipeline_plans_search() {
        let pipeline = SearchPipeline::default();
        let plan = pipeline
            .plan(RawSearchParams {
                search: Some("786".into()),
                delivery: Some("7".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            plan.filters.to_strings(),
            vec!["available.eq.true", "number.ilike.*786*", "delivery.eq.7"]
        );
    }

    #[test]
    fn validation_error_displays_every_message() {
        let err = SearchPipeline::default()
            .plan(RawSearchParams {
                search_type: Some("bogus".into()),
                range: Some("9-1".into()),
                ..Default::default()
            })
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("type:"));
        assert!(text.contains("range: start must not be greater than end."));
    }

    #[test]
    fn metrics_recorder_tracks_pipeline_outcome() {
        let metrics = Arc::new(CountingMetrics::default());
        set_pipeline_metrics(Some(metrics.clone()));

        let _ = plan_search(RawSearchParams::default(), &SearchPolicy::default());
        let _ = plan_search(
            RawSearchParams {
                match_mode: Some("close".into()),
                ..Default::default()
            },
            &SearchPolicy::default(),
        );
        let raw = RawPurchase {
            partner_id: json!("acme"),
            email: json!(null),
            items: vec![json!({"number": "07700900123"})],
        };
        let _ = plan_purchase(raw, "acme", &PurchasePolicy::default());

        let events = metrics.snapshot();
        assert!(events.contains(&"search_ok"));
        assert!(events.contains(&"search_err"));
        assert!(events.contains(&"purchase_ok"));

        set_pipeline_metrics(None);
    }
}
