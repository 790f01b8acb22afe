//! Memorable Number Search
//!
//! This crate turns the loose query parameters of a number search into the
//! exact PostgREST filters the data API understands. It does no I/O: the
//! server crate owns the HTTP calls, we own the rules.
//!
//! ## What we do here
//!
//! - **Normalize** - Strip whitespace everywhere, treat blanks as absent, and
//!   map letters to keypad digits so `TAXI` searches for `8294`.
//! - **Validate** - Check every parameter and report *all* failures at once,
//!   each with the human-readable message callers see in the 400 response.
//! - **Build filters** - An ordered list of `column.op.value` clauses, always
//!   starting with `available.eq.true`.
//! - **Shape results** - Parse `Content-Range` into a total count and the range
//!   actually served.
//! - **Describe usage** - The search log row and the daily usage counter
//!   arguments written after every successful search.
//!
//! ## Main entry point
//!
//! Call [`prepare`] with [`RawSearchParams`] and a [`SearchPolicy`]. You get a
//! [`SearchPlan`] holding the validated query and its filters, or
//! [`ValidationErrors`] listing every rule that failed.
//!
//! ## Example
//!
//! ```
//! use search::{prepare, RawSearchParams, SearchPolicy, Violation};
//!
//! let policy = SearchPolicy::default();
//!
//! let raw = RawSearchParams {
//!     search: Some("taxi".into()),
//!     match_mode: Some("exact".into()),
//!     ..Default::default()
//! };
//! let plan = prepare(raw, &policy).unwrap();
//! assert_eq!(plan.filters.to_strings(), vec!["available.eq.true", "number.eq.8294"]);
//!
//! let raw = RawSearchParams {
//!     range: Some("0-150".into()),
//!     ..Default::default()
//! };
//! let errors = prepare(raw, &policy).unwrap_err();
//! assert!(errors.contains(&Violation::RangeTooWide { max: 100 }));
//! assert_eq!(errors.to_string(), "range: must not exceed 100 indexes.");
//! ```
use std::time::Instant;

use tracing::{debug, warn};

mod error;
mod filter;
mod normalize;
mod policy;
mod result;
mod types;
mod usage;
mod validate;

pub use crate::error::{PolicyError, ValidationErrors, Violation};
pub use crate::filter::{build_filters, Filter, FilterOp, FilterSet};
pub use crate::normalize::{
    keypad_digit, keypad_digits, normalize, strip_whitespace, NormalizedParams, RawSearchParams,
    DEFAULT_SEARCH_TYPE,
};
pub use crate::policy::SearchPolicy;
pub use crate::result::{ContentRange, SearchResult};
pub use crate::types::{IndexRange, MatchMode, SearchPattern, SearchQuery, SearchTerm, SearchType};
pub use crate::usage::{UsageIncrement, UsageLogEntry, UNKNOWN_SOURCE};
pub use crate::validate::{is_valid_price, validate, MAX_PATTERN_SEGMENTS};

/// A validated query plus the filters that implement it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub query: SearchQuery,
    pub filters: FilterSet,
}

/// Normalize, validate, and build filters in one go.
pub fn prepare(raw: RawSearchParams, policy: &SearchPolicy) -> Result<SearchPlan, ValidationErrors> {
    let start = Instant::now();
    let params = normalize(raw);

    match validate(&params, policy) {
        Ok(query) => {
            let filters = build_filters(&query);
            let elapsed_micros = start.elapsed().as_micros();
            debug!(
                search_type = %query.search_type,
                match_mode = %query.match_mode,
                filter_count = filters.len(),
                elapsed_micros,
                "search_prepared"
            );
            Ok(SearchPlan { query, filters })
        }
        Err(errors) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(
                search_type = %params.search_type,
                violations = errors.len(),
                elapsed_micros,
                "search_rejected"
            );
            Err(errors)
        }
    }
}
