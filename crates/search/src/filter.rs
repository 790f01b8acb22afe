//! PostgREST filter construction.
//!
//! A validated [`SearchQuery`] becomes an ordered [`FilterSet`]:
//!
//! ```text
//! available.eq.true            always first
//! <search clause(s)>           always present (wildcard when no term)
//! price.gte.<v> / price.lte.<v> only when supplied
//! delivery.eq.<v>              only when supplied
//! ```
//!
//! The set renders as one compound AND expression for the `and=` query
//! parameter.
//!
//! ```rust
//! use search::{build_filters, normalize, validate, RawSearchParams, SearchPolicy};
//!
//! let raw = RawSearchParams {
//!     search_type: Some("prefix".into()),
//!     search: Some("0207".into()),
//!     match_mode: Some("exact".into()),
//!     ..Default::default()
//! };
//! let query = validate(&normalize(raw), &SearchPolicy::default()).unwrap();
//! let filters = build_filters(&query);
//! assert_eq!(filters.to_strings(), vec!["available.eq.true", "prefix.eq.0207"]);
//! assert_eq!(filters.and_expression(), "(available.eq.true,prefix.eq.0207)");
//! ```
use std::fmt;

use crate::types::{MatchMode, SearchQuery, SearchTerm, SearchType};

/// PostgREST operator plus operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq(String),
    /// Case-insensitive LIKE; `*` is the wildcard.
    ILike(String),
    Gte(String),
    Lte(String),
    In(Vec<String>),
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Eq(value) => write!(f, "eq.{value}"),
            FilterOp::ILike(pattern) => write!(f, "ilike.{pattern}"),
            FilterOp::Gte(value) => write!(f, "gte.{value}"),
            FilterOp::Lte(value) => write!(f, "lte.{value}"),
            FilterOp::In(values) => write!(f, "in.({})", values.join(",")),
        }
    }
}

/// One `column.op.value` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }

    pub fn available() -> Self {
        Self::new("available", FilterOp::Eq("true".to_string()))
    }

    /// `column=op.value` form for horizontal filtering in the query string.
    pub fn to_query_pair(&self) -> (String, String) {
        (self.column.clone(), self.op.to_string())
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.column, self.op)
    }
}

/// Ordered clauses for one search. Always starts with `available.eq.true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    fn new() -> Self {
        Self(vec![Filter::available()])
    }

    fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    pub fn as_slice(&self) -> &[Filter] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// `(c1,c2,...)`, the value of the `and=` query parameter.
    pub fn and_expression(&self) -> String {
        format!("({})", self.to_strings().join(","))
    }
}

/// Build the filters for a validated query.
pub fn build_filters(query: &SearchQuery) -> FilterSet {
    let mut filters = FilterSet::new();
    let column = query.search_type.column();

    match &query.term {
        SearchTerm::Any => filters.push(Filter::new(column, FilterOp::ILike("*".to_string()))),
        SearchTerm::Pattern(pattern) => {
            let number = SearchType::Number.column();
            if let Some(start) = pattern.starts_with() {
                filters.push(Filter::new(number, FilterOp::ILike(format!("{start}*"))));
            }
            if let Some(middle) = pattern.contains() {
                filters.push(Filter::new(number, FilterOp::ILike(format!("*{middle}*"))));
            }
            if let Some(end) = pattern.ends_with() {
                filters.push(Filter::new(number, FilterOp::ILike(format!("*{end}"))));
            }
        }
        SearchTerm::Digits(digits) => match query.match_mode {
            MatchMode::Exact => filters.push(Filter::new(column, FilterOp::Eq(digits.clone()))),
            MatchMode::Fuzzy => {
                filters.push(Filter::new(column, FilterOp::ILike(format!("*{digits}*"))))
            }
        },
    }

    if let Some(price) = &query.price_gte {
        filters.push(Filter::new("price", FilterOp::Gte(price.clone())));
    }
    if let Some(price) = &query.price_lte {
        filters.push(Filter::new("price", FilterOp::Lte(price.clone())));
    }
    if let Some(delivery) = &query.delivery {
        filters.push(Filter::new("delivery", FilterOp::Eq(delivery.clone())));
    }

    filters
}
