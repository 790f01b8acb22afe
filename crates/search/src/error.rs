//! Error types produced by the search crate.
//!
//! Validation never stops at the first problem: every rule is evaluated and
//! each failing rule contributes one [`Violation`]. The full list travels in
//! [`ValidationErrors`] so the HTTP layer can report every message at once.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`Violation`] | Validation | One failed parameter rule |
//! | [`ValidationErrors`] | Validation | All failed rules for one request |
//! | [`PolicyError`] | Configuration | Inconsistent [`SearchPolicy`](crate::SearchPolicy) limits |
//!
//! ```rust
//! use search::Violation;
//!
//! let err = Violation::RangeTooWide { max: 100 };
//! assert_eq!(err.to_string(), "range: must not exceed 100 indexes.");
//! ```
use std::fmt;

use thiserror::Error;

/// A single failed validation rule.
///
/// The `Display` text is what callers see in the 400 response, so each
/// message names the offending parameter first.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Violation {
    #[error(r#"type: must be "number", "prefix", or "last_six". Omit to default to "number"."#)]
    InvalidType,

    #[error("search: must contain only digits (0-9).")]
    SearchNotDigits,

    #[error(r#"search: must be at most {max} characters for type "{search_type}"."#)]
    SearchTooLong { max: usize, search_type: String },

    #[error(r#"search: comma-separated patterns are only supported with type "number"."#)]
    PatternRequiresNumberType,

    #[error(r#"search: comma-separated patterns cannot be combined with match "exact"."#)]
    PatternWithExactMatch,

    #[error("search: comma-separated patterns accept at most {max} segments.")]
    PatternTooManySegments { max: usize },

    #[error("search: comma-separated patterns need at least one populated segment.")]
    PatternEmpty,

    #[error("search: segment {position} must contain only digits (0-9).")]
    PatternSegmentNotDigits { position: usize },

    #[error("search: segment {position} must be at most {max} characters.")]
    PatternSegmentTooLong { position: usize, max: usize },

    #[error(r#"match: must be "exact" or "fuzzy". Omit to default to "fuzzy"."#)]
    InvalidMatch,

    #[error("{param}: must be a valid number with at most 2 decimal places, max {max} characters, or omitted.")]
    InvalidPrice { param: &'static str, max: usize },

    #[error(r#"range: must be "start-end" (two non-negative integers). Omit for the first page of results."#)]
    InvalidRangeFormat,

    #[error("range: start must not be greater than end.")]
    RangeReversed,

    #[error("range: must not exceed {max} indexes.")]
    RangeTooWide { max: u64 },

    #[error("delivery: must be at most 2 characters.")]
    DeliveryTooLong,

    #[error("delivery: must contain only digits (0-9).")]
    DeliveryNotDigits,

    #[error("delivery: must be {allowed}.")]
    DeliveryNotAllowed { allowed: String },
}

/// Every rule a request failed, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<Violation>);

impl ValidationErrors {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self(violations)
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rendered messages, one per failed rule.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

/// Inconsistent [`SearchPolicy`](crate::SearchPolicy) settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("{field} must be greater than zero")]
    ZeroLimit { field: &'static str },

    #[error("max_partial_search_len ({partial}) exceeds max_search_len ({full})")]
    PartialExceedsFull { partial: usize, full: usize },

    #[error("allowed_deliveries must not be empty when the delivery filter is enabled")]
    NoDeliveries,

    #[error("allowed delivery value {0:?} must be 1-2 digits")]
    InvalidDelivery(String),
}
