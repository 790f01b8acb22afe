//! YAML policy file support.
//!
//! Deployments tune the search and purchase rules from one YAML file instead
//! of recompiling. Every section and field is optional; omitted values keep
//! their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "partner portal"
//!
//! search:
//!   max_search_len: 11
//!   max_partial_search_len: 6
//!   max_range_span: 100
//!   multi_part_search: true
//!   delivery_filter: true
//!   allowed_deliveries: ["1", "7"]
//!
//! purchase:
//!   max_body_bytes: 20000
//!   max_items: 100
//! ```

use std::fs;
use std::path::Path;

use purchase::PurchasePolicy;
use search::{PolicyError, SearchPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML policy files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

impl From<PolicyError> for ConfigLoadError {
    fn from(err: PolicyError) -> Self {
        ConfigLoadError::Validation(format!("search: {err}"))
    }
}

/// Top-level policy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub search: SearchPolicy,

    #[serde(default)]
    pub purchase: PurchasePolicy,
}

impl PolicyConfig {
    /// Load a YAML policy file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML policy document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PolicyConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.search.validate()?;
        if let Some(field) = self.purchase.zero_limit() {
            return Err(ConfigLoadError::Validation(format!(
                "purchase: {field} must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            search: SearchPolicy::default(),
            purchase: PurchasePolicy::default(),
        }
    }
}
