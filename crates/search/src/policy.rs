//! Validation limits and feature switches for the search pipeline.
//!
//! A single [`SearchPolicy`] describes which parameters a deployment accepts
//! and how strictly they are checked. It is cheap to clone and deserializes
//! from JSON or YAML with every field optional.
//!
//! ```rust
//! use search::SearchPolicy;
//!
//! let policy = SearchPolicy::default();
//! assert_eq!(policy.max_search_len, 11);
//! assert_eq!(policy.max_range_span, Some(100));
//! assert!(policy.validate().is_ok());
//! ```
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Runtime limits applied by [`validate`](crate::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Maximum digits in a `type=number` search and in each pattern segment.
    ///
    /// Default: `11`
    pub max_search_len: usize,

    /// Maximum digits when searching the `prefix` or `last_six` columns.
    ///
    /// Default: `6`
    pub max_partial_search_len: usize,

    /// Maximum characters for `price_gte` / `price_lte`.
    ///
    /// Default: `15`
    pub max_price_len: usize,

    /// Maximum rows a `range` may cover (`end - start + 1`). `None` lifts the cap.
    ///
    /// Default: `Some(100)`
    pub max_range_span: Option<u64>,

    /// Whether comma-separated `start,contains,end` patterns are recognised.
    /// When disabled a comma is just an invalid character.
    ///
    /// Default: `true`
    pub multi_part_search: bool,

    /// Whether the `delivery` parameter is honoured. When disabled the
    /// parameter is ignored rather than rejected.
    ///
    /// Default: `true`
    pub delivery_filter: bool,

    /// Accepted `delivery` values.
    ///
    /// Default: `["1", "7"]`
    pub allowed_deliveries: Vec<String>,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            max_search_len: 11,
            max_partial_search_len: 6,
            max_price_len: 15,
            max_range_span: Some(100),
            multi_part_search: true,
            delivery_filter: true,
            allowed_deliveries: vec!["1".to_string(), "7".to_string()],
        }
    }
}

impl SearchPolicy {
    /// Check the policy for internally inconsistent limits.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_search_len == 0 {
            return Err(PolicyError::ZeroLimit {
                field: "max_search_len",
            });
        }
        if self.max_partial_search_len == 0 {
            return Err(PolicyError::ZeroLimit {
                field: "max_partial_search_len",
            });
        }
        if self.max_price_len == 0 {
            return Err(PolicyError::ZeroLimit {
                field: "max_price_len",
            });
        }
        if self.max_range_span == Some(0) {
            return Err(PolicyError::ZeroLimit {
                field: "max_range_span",
            });
        }
        if self.max_partial_search_len > self.max_search_len {
            return Err(PolicyError::PartialExceedsFull {
                partial: self.max_partial_search_len,
                full: self.max_search_len,
            });
        }
        if self.delivery_filter {
            if self.allowed_deliveries.is_empty() {
                return Err(PolicyError::NoDeliveries);
            }
            if let Some(bad) = self.allowed_deliveries.iter().find(|value| {
                value.is_empty() || value.len() > 2 || !value.bytes().all(|b| b.is_ascii_digit())
            }) {
                return Err(PolicyError::InvalidDelivery(bad.clone()));
            }
        }
        Ok(())
    }

    /// `"1 or 7"` style rendering of the accepted delivery values.
    pub(crate) fn describe_deliveries(&self) -> String {
        match self.allowed_deliveries.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}
