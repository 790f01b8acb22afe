use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds, also used for outbound calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest accepted purchase body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Base URL of the REST data API, without `/rest/v1`
    #[serde(default)]
    pub database_base_url: String,

    /// Service key sent as `apikey` and bearer token
    #[serde(default)]
    pub database_api_key: String,

    /// Purchase webhook; purchases answer 503 when unset
    #[serde(default)]
    pub purchase_webhook_url: Option<String>,

    #[serde(default = "default_numbers_table")]
    pub numbers_table: String,

    #[serde(default = "default_search_log_table")]
    pub search_log_table: String,

    #[serde(default = "default_usage_rpc")]
    pub usage_rpc: String,

    #[serde(default = "default_verify_key_rpc")]
    pub verify_key_rpc: String,

    /// Reject searches that carry no `X-API-Key`
    #[serde(default)]
    pub search_requires_api_key: bool,

    /// Most items per purchase request
    #[serde(default = "default_max_purchase_items")]
    pub max_purchase_items: usize,

    /// Optional YAML file with search and purchase policies
    #[serde(default)]
    pub policy_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            database_base_url: String::new(),
            database_api_key: String::new(),
            purchase_webhook_url: None,
            numbers_table: default_numbers_table(),
            search_log_table: default_search_log_table(),
            usage_rpc: default_usage_rpc(),
            verify_key_rpc: default_verify_key_rpc(),
            search_requires_api_key: false,
            max_purchase_items: default_max_purchase_items(),
            policy_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("NUMBERS_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Refuse to start without data API credentials
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_base_url.trim().is_empty() {
            anyhow::bail!("database_base_url is not configured");
        }
        if self.database_api_key.trim().is_empty() {
            anyhow::bail!("database_api_key is not configured");
        }
        if self.max_purchase_items == 0 {
            anyhow::bail!("max_purchase_items must be greater than zero");
        }
        if self.purchase_webhook_url.is_none() {
            tracing::warn!("No purchase webhook configured, purchases will answer 503");
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{base}/rest/v1` with any trailing slash removed from the base
    pub fn rest_base(&self) -> String {
        format!("{}/rest/v1", self.database_base_url.trim_end_matches('/'))
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_numbers_table() -> String {
    "mobile_numbers".to_string()
}

fn default_search_log_table() -> String {
    "search_queries".to_string()
}

fn default_usage_rpc() -> String {
    "increment_partner_daily_usage".to_string()
}

fn default_verify_key_rpc() -> String {
    "verify_partner_api_key".to_string()
}

fn default_max_purchase_items() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_bytes, 20_000);
        assert_eq!(cfg.max_purchase_items, 100);
        assert_eq!(cfg.numbers_table, "mobile_numbers");
        assert!(!cfg.search_requires_api_key);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut cfg = ServerConfig::default();
        assert!(cfg.validate().is_err());

        cfg.database_base_url = "https://db.example".into();
        assert!(cfg.validate().is_err());

        cfg.database_api_key = "service-key".into();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_rest_base_trims_slash() {
        let cfg = ServerConfig {
            database_base_url: "https://db.example/".into(),
            ..Default::default()
        };
        assert_eq!(cfg.rest_base(), "https://db.example/rest/v1");
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{"database_base_url": "https://db.example", "search_requires_api_key": true}"#,
        )
        .unwrap();
        assert!(cfg.search_requires_api_key);
        assert_eq!(cfg.verify_key_rpc, "verify_partner_api_key");
    }
}
