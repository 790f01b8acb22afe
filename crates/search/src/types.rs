//! Typed values produced by the validator.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which number column a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// The full number.
    #[default]
    Number,
    /// The leading digits (area or network code).
    Prefix,
    /// The trailing six digits.
    LastSix,
}

impl SearchType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "number" => Some(Self::Number),
            "prefix" => Some(Self::Prefix),
            "last_six" => Some(Self::LastSix),
            _ => None,
        }
    }

    /// Query-string spelling, which is also the column name in the numbers table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Prefix => "prefix",
            Self::LastSix => "last_six",
        }
    }

    pub const fn column(self) -> &'static str {
        self.as_str()
    }

    /// `prefix` and `last_six` hold partial numbers and take shorter terms.
    pub const fn is_partial(self) -> bool {
        matches!(self, Self::Prefix | Self::LastSix)
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact equality or substring containment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    #[default]
    Fuzzy,
}

impl MatchMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exact" => Some(Self::Exact),
            "fuzzy" => Some(Self::Fuzzy),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive row window, rendered as `start-end` in `Range` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IndexRange {
    start: u64,
    end: u64,
}

impl IndexRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub const fn start(&self) -> u64 {
        self.start
    }

    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of rows covered by the window, saturating at `u64::MAX`.
    pub const fn row_count(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Parse `start-end` with both bounds non-negative integers and `start <= end`.
    pub fn parse(value: &str) -> Option<Self> {
        let (start, end) = value.split_once('-')?;
        if !is_digits(start) || !is_digits(end) {
            return None;
        }
        Self::new(start.parse().ok()?, end.parse().ok()?)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A `start,contains,end` search pattern against the full number.
///
/// Only populated segments produce filters, and the `end` segment counts
/// only when all three segments were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchPattern {
    segments: Vec<String>,
}

impl SearchPattern {
    pub(crate) fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn starts_with(&self) -> Option<&str> {
        self.populated(0)
    }

    pub fn contains(&self) -> Option<&str> {
        self.populated(1)
    }

    pub fn ends_with(&self) -> Option<&str> {
        if self.segments.len() == 3 {
            self.populated(2)
        } else {
            None
        }
    }

    fn populated(&self, index: usize) -> Option<&str> {
        self.segments
            .get(index)
            .map(String::as_str)
            .filter(|segment| !segment.is_empty())
    }
}

/// What the caller is searching for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SearchTerm {
    /// No term: every available number matches.
    #[default]
    Any,
    Digits(String),
    Pattern(SearchPattern),
}

impl SearchTerm {
    /// The effective term as sent to the data API and written to the search log.
    pub fn as_log_value(&self) -> Option<String> {
        match self {
            Self::Any => None,
            Self::Digits(digits) => Some(digits.clone()),
            Self::Pattern(pattern) => Some(pattern.segments().join(",")),
        }
    }
}

/// A fully validated search request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub search_type: SearchType,
    pub term: SearchTerm,
    pub match_mode: MatchMode,
    pub price_gte: Option<String>,
    pub price_lte: Option<String>,
    pub range: Option<IndexRange>,
    pub delivery: Option<String>,
    /// The `search` value exactly as the caller sent it.
    pub submitted_search: Option<String>,
    /// The `range` value exactly as the caller sent it.
    pub submitted_range: Option<String>,
}

pub(crate) fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_type_round_trips_through_str() {
        for ty in [SearchType::Number, SearchType::Prefix, SearchType::LastSix] {
            assert_eq!(SearchType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(SearchType::parse("Number"), None);
    }

    #[test]
    fn index_range_parse() {
        let range = IndexRange::parse("10-19").unwrap();
        assert_eq!(range.start(), 10);
        assert_eq!(range.end(), 19);
        assert_eq!(range.row_count(), 10);
        assert_eq!(range.to_string(), "10-19");

        assert!(IndexRange::parse("19-10").is_none());
        assert!(IndexRange::parse("-5").is_none());
        assert!(IndexRange::parse("1-2-3").is_none());
        assert!(IndexRange::parse("+1-2").is_none());
        assert!(IndexRange::parse("99999999999999999999999-1").is_none());
    }

    #[test]
    fn full_width_range_saturates_row_count() {
        let range = IndexRange::parse("0-18446744073709551615").unwrap();
        assert_eq!(range.row_count(), u64::MAX);
        assert_eq!(IndexRange::new(u64::MAX, u64::MAX).unwrap().row_count(), 1);
    }

    #[test]
    fn pattern_ends_with_requires_three_segments() {
        let two = SearchPattern::new(vec!["1".into(), "5".into()]);
        assert_eq!(two.starts_with(), Some("1"));
        assert_eq!(two.contains(), Some("5"));
        assert_eq!(two.ends_with(), None);

        let three = SearchPattern::new(vec!["".into(), "".into(), "5".into()]);
        assert_eq!(three.starts_with(), None);
        assert_eq!(three.ends_with(), Some("5"));
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&SearchType::LastSix).unwrap(),
            "\"last_six\""
        );
        assert_eq!(serde_json::to_string(&MatchMode::Fuzzy).unwrap(), "\"fuzzy\"");
    }
}
