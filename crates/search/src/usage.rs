//! Search log and usage counter records.
//!
//! Both are written best-effort after the caller already has the answer.
use chrono::NaiveDate;
use serde::Serialize;

use crate::result::SearchResult;
use crate::types::{MatchMode, SearchQuery, SearchType};

/// Referrer recorded when the request carried no `Referer` header.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// One row of the search log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageLogEntry {
    pub partner_id: Option<String>,
    /// What the caller typed.
    pub submitted_search: Option<String>,
    /// What was actually searched for, after keypad conversion.
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub search_type: SearchType,
    #[serde(rename = "match")]
    pub match_mode: MatchMode,
    pub count: u64,
    pub submitted_range: Option<String>,
    pub effective_range: Option<String>,
    pub source: String,
    pub mobile: u8,
    pub landline: u8,
}

impl UsageLogEntry {
    pub fn new(
        query: &SearchQuery,
        result: &SearchResult,
        partner_id: Option<&str>,
        source: Option<&str>,
    ) -> Self {
        Self {
            partner_id: partner_id.map(str::to_string),
            submitted_search: query.submitted_search.clone(),
            search: query.term.as_log_value(),
            search_type: query.search_type,
            match_mode: query.match_mode,
            count: result.total_count.unwrap_or(0),
            submitted_range: query.submitted_range.clone(),
            effective_range: result.effective_range.map(|range| range.to_string()),
            source: source
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_SOURCE)
                .to_string(),
            mobile: 1,
            landline: 0,
        }
    }

    /// Arguments for the daily per-partner usage counter. Anonymous
    /// searches are not counted.
    pub fn usage_increment(&self, day: NaiveDate) -> Option<UsageIncrement> {
        self.partner_id.as_ref().map(|partner_id| UsageIncrement {
            p_partner_id: partner_id.clone(),
            p_day: day,
        })
    }
}

/// RPC arguments for bumping a partner's counter for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageIncrement {
    pub p_partner_id: String,
    pub p_day: NaiveDate,
}
