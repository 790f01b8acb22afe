use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::rest::{DataApi, HttpWebhook, PostgrestClient, WebhookSink};
use crate::usage::UsageTargets;
use metrics_exporter_prometheus::PrometheusHandle;
use numbers_api::config::PolicyConfig;
use numbers_api::{PurchasePolicy, SearchPipeline};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// REST data API used for searches, logging, key checks and lookups
    pub data_api: Arc<dyn DataApi>,

    /// Purchase webhook, if one is configured
    pub webhook: Option<Arc<dyn WebhookSink>>,

    /// Search planning with the loaded policy
    pub pipeline: SearchPipeline,

    pub purchase_policy: PurchasePolicy,

    /// Renders `/metrics`; `None` when metrics are disabled
    pub metrics_handle: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create state with reqwest-backed clients built from `config`
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let data_api = PostgrestClient::new(
            config.rest_base(),
            config.database_api_key.clone(),
            config.timeout(),
        )
        .map_err(|err| ServerError::Config(err.to_string()))?;

        let webhook = match &config.purchase_webhook_url {
            Some(url) => {
                let sink = HttpWebhook::new(url.clone(), config.timeout())
                    .map_err(|err| ServerError::Config(err.to_string()))?;
                Some(Arc::new(sink) as Arc<dyn WebhookSink>)
            }
            None => None,
        };

        let policy = load_policy(&config)?;
        Self::with_clients(config, Arc::new(data_api), webhook, policy)
    }

    /// Create state around existing clients
    pub fn with_clients(
        config: ServerConfig,
        data_api: Arc<dyn DataApi>,
        webhook: Option<Arc<dyn WebhookSink>>,
        policy: PolicyConfig,
    ) -> ServerResult<Self> {
        policy
            .validate()
            .map_err(|err| ServerError::Config(err.to_string()))?;
        let pipeline = SearchPipeline::new(policy.search)?;

        Ok(Self {
            config: Arc::new(config),
            data_api,
            webhook,
            pipeline,
            purchase_policy: policy.purchase,
            metrics_handle: None,
        })
    }

    pub fn with_metrics_handle(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics_handle = handle;
        self
    }

    pub fn usage_targets(&self) -> UsageTargets {
        UsageTargets {
            log_table: self.config.search_log_table.clone(),
            usage_rpc: self.config.usage_rpc.clone(),
        }
    }
}

/// The policy file wins when configured; otherwise purchase limits come
/// from the server configuration.
pub fn load_policy(config: &ServerConfig) -> ServerResult<PolicyConfig> {
    match &config.policy_file {
        Some(path) => {
            let policy = PolicyConfig::from_file(path)
                .map_err(|err| ServerError::Config(format!("{path}: {err}")))?;
            tracing::info!(path = %path, name = ?policy.name, "policy_loaded");
            Ok(policy)
        }
        None => Ok(PolicyConfig {
            purchase: PurchasePolicy {
                max_body_bytes: config.max_body_bytes,
                max_items: config.max_purchase_items,
                ..Default::default()
            },
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_api_key;
    use crate::rest::{RestError, RowPage, RowQuery};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct KeyApi {
        reply: Result<Value, RestError>,
    }

    #[async_trait]
    impl DataApi for KeyApi {
        async fn list_rows(&self, _query: &RowQuery) -> Result<RowPage, RestError> {
            Ok(RowPage::default())
        }

        async fn insert_row(&self, _table: &str, _row: &Value) -> Result<(), RestError> {
            Ok(())
        }

        async fn call_rpc(&self, _function: &str, _args: &Value) -> Result<Value, RestError> {
            self.reply.clone()
        }
    }

    fn state(reply: Result<Value, RestError>) -> ServerState {
        ServerState::with_clients(
            ServerConfig::default(),
            Arc::new(KeyApi { reply }),
            None,
            PolicyConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn policy_defaults_follow_server_config() {
        let config = ServerConfig {
            max_body_bytes: 4_096,
            max_purchase_items: 5,
            ..Default::default()
        };
        let policy = load_policy(&config).unwrap();
        assert_eq!(policy.purchase.max_body_bytes, 4_096);
        assert_eq!(policy.purchase.max_items, 5);
    }

    #[test]
    fn missing_policy_file_is_a_config_error() {
        let config = ServerConfig {
            policy_file: Some("/no/such/policy.yaml".into()),
            ..Default::default()
        };
        assert!(matches!(load_policy(&config), Err(ServerError::Config(_))));
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let mut policy = PolicyConfig::default();
        policy.search.allowed_deliveries.clear();
        let result = ServerState::with_clients(
            ServerConfig::default(),
            Arc::new(KeyApi { reply: Ok(Value::Null) }),
            None,
            policy,
        );
        assert!(result.is_err());
    }

    #[test]
    fn key_verification_outcomes() {
        let ok = tokio_test::block_on(verify_api_key(&state(Ok(json!("acme"))), "k")).unwrap();
        assert_eq!(ok.as_str(), "acme");

        let unknown = tokio_test::block_on(verify_api_key(&state(Ok(json!([]))), "k"));
        assert!(matches!(unknown, Err(ServerError::InvalidApiKey)));

        let rejected = tokio_test::block_on(verify_api_key(
            &state(Err(RestError::Status {
                status: 400,
                body: "bad hash".into(),
            })),
            "k",
        ));
        assert!(matches!(rejected, Err(ServerError::Unauthorized)));

        let down = tokio_test::block_on(verify_api_key(
            &state(Err(RestError::Transport("refused".into()))),
            "k",
        ));
        assert!(matches!(down, Err(ServerError::BadGateway(_))));
    }
}
