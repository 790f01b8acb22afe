//! Shaping the data API's answer.
//!
//! PostgREST reports pagination in `Content-Range` as `start-end/total`.
//! Either side may be `*` when unknown (`*/0` for an empty result, `0-24/*`
//! when no count was requested).
use serde_json::Value;

use crate::types::IndexRange;

/// Parsed `Content-Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// The rows the backend actually served.
    pub served: Option<IndexRange>,
    /// Total matching rows.
    pub total: Option<u64>,
}

impl ContentRange {
    pub fn parse(header: &str) -> Option<Self> {
        let (served, total) = header.trim().split_once('/')?;
        let served = match served {
            "*" => None,
            other => Some(IndexRange::parse(other)?),
        };
        let total = match total {
            "*" => None,
            other => Some(other.parse().ok()?),
        };
        Some(Self { served, total })
    }
}

/// Rows plus the pagination metadata extracted from the response headers.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub rows: Vec<Value>,
    pub total_count: Option<u64>,
    pub effective_range: Option<IndexRange>,
    /// The raw header, echoed back to the caller.
    pub content_range: Option<String>,
}

impl SearchResult {
    pub fn from_upstream(rows: Vec<Value>, content_range: Option<String>) -> Self {
        let parsed = content_range.as_deref().and_then(ContentRange::parse);
        Self {
            rows,
            total_count: parsed.and_then(|range| range.total),
            effective_range: parsed.and_then(|range| range.served),
            content_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_header() {
        let range = ContentRange::parse("0-24/3573458").unwrap();
        assert_eq!(range.served, IndexRange::new(0, 24));
        assert_eq!(range.total, Some(3573458));
    }

    #[test]
    fn parses_unknown_parts() {
        assert_eq!(
            ContentRange::parse("*/0"),
            Some(ContentRange {
                served: None,
                total: Some(0)
            })
        );
        assert_eq!(
            ContentRange::parse("10-19/*"),
            Some(ContentRange {
                served: IndexRange::new(10, 19),
                total: None
            })
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(ContentRange::parse(""), None);
        assert_eq!(ContentRange::parse("0-24"), None);
        assert_eq!(ContentRange::parse("a-b/10"), None);
        assert_eq!(ContentRange::parse("0-24/many"), None);
    }

    #[test]
    fn result_extracts_metadata() {
        let result = SearchResult::from_upstream(
            vec![json!({"number": "07700900123"})],
            Some("0-0/1".to_string()),
        );
        assert_eq!(result.total_count, Some(1));
        assert_eq!(result.effective_range, IndexRange::new(0, 0));
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn result_without_header() {
        let result = SearchResult::from_upstream(vec![], None);
        assert_eq!(result.total_count, None);
        assert_eq!(result.effective_range, None);
    }
}
