//! Parameter normalization.
//!
//! Raw query-string values are cleaned before any rule runs:
//!
//! 1. every whitespace character is removed, including internal ones;
//! 2. a value that ends up empty is treated as absent;
//! 3. letters in `search` are mapped to telephone keypad digits
//!    (`"FLOWERS"` becomes `"3569377"`);
//! 4. `type` defaults to `"number"`.
//!
//! Normalization is pure and idempotent: feeding the output back in yields
//! the same values.
//!
//! ```rust
//! use search::{normalize, RawSearchParams};
//!
//! let raw = RawSearchParams {
//!     search: Some(" call me ".into()),
//!     ..Default::default()
//! };
//! let params = normalize(raw);
//! assert_eq!(params.search.as_deref(), Some("225563"));
//! assert_eq!(params.search_type, "number");
//! ```
use serde::{Deserialize, Serialize};

/// Query parameters exactly as received, every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSearchParams {
    #[serde(rename = "type", default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(rename = "match", default)]
    pub match_mode: Option<String>,
    #[serde(default)]
    pub price_gte: Option<String>,
    #[serde(default)]
    pub price_lte: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub delivery: Option<String>,
}

impl RawSearchParams {
    /// Build from decoded query pairs. A repeated key keeps its first value;
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut raw = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "type" => &mut raw.search_type,
                "search" => &mut raw.search,
                "match" => &mut raw.match_mode,
                "price_gte" => &mut raw.price_gte,
                "price_lte" => &mut raw.price_lte,
                "range" => &mut raw.range,
                "delivery" => &mut raw.delivery,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        raw
    }
}

/// Whitespace-free, defaulted parameters. Still untyped strings; the
/// validator decides whether they are acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedParams {
    pub search_type: String,
    pub search: Option<String>,
    pub match_mode: Option<String>,
    pub price_gte: Option<String>,
    pub price_lte: Option<String>,
    pub range: Option<String>,
    pub delivery: Option<String>,
    /// Caller's original `search`, kept for the search log.
    pub submitted_search: Option<String>,
    /// Caller's original `range`, kept for the search log.
    pub submitted_range: Option<String>,
}

pub const DEFAULT_SEARCH_TYPE: &str = "number";

/// Normalize raw parameters. See the module docs for the steps.
pub fn normalize(raw: RawSearchParams) -> NormalizedParams {
    let submitted_search = raw.search.clone().filter(|s| !s.trim().is_empty());
    let submitted_range = raw.range.clone().filter(|s| !s.trim().is_empty());

    NormalizedParams {
        search_type: strip_whitespace(raw.search_type)
            .unwrap_or_else(|| DEFAULT_SEARCH_TYPE.to_string()),
        search: strip_whitespace(raw.search).map(|s| keypad_digits(&s)),
        match_mode: strip_whitespace(raw.match_mode),
        price_gte: strip_whitespace(raw.price_gte),
        price_lte: strip_whitespace(raw.price_lte),
        range: strip_whitespace(raw.range),
        delivery: strip_whitespace(raw.delivery),
        submitted_search,
        submitted_range,
    }
}

/// Remove every whitespace character; `None` if nothing is left.
pub fn strip_whitespace(value: Option<String>) -> Option<String> {
    let value = value?;
    let stripped: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    (!stripped.is_empty()).then_some(stripped)
}

/// Digit on a standard telephone keypad for an ASCII letter.
pub fn keypad_digit(letter: char) -> Option<char> {
    let digit = match letter.to_ascii_uppercase() {
        'A'..='C' => '2',
        'D'..='F' => '3',
        'G'..='I' => '4',
        'J'..='L' => '5',
        'M'..='O' => '6',
        'P'..='S' => '7',
        'T'..='V' => '8',
        'W'..='Z' => '9',
        _ => return None,
    };
    Some(digit)
}

/// Replace ASCII letters with keypad digits, leaving everything else alone.
pub fn keypad_digits(value: &str) -> String {
    if !value.chars().any(|c| c.is_ascii_alphabetic()) {
        return value.to_string();
    }
    value
        .chars()
        .map(|c| keypad_digit(c).unwrap_or(c))
        .collect()
}
