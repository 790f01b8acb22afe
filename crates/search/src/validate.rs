//! Parameter validation.
//!
//! Each rule below runs independently and contributes at most one
//! [`Violation`]. Nothing short-circuits, so a caller sending three bad
//! parameters hears about all three.
//!
//! | Parameter | Rule |
//! |-----------|------|
//! | `type` | `number`, `prefix` or `last_six` |
//! | `search` | digits; at most 11, or 6 for `prefix`/`last_six` |
//! | `search` with commas | 1-3 segments, `type=number`, not `match=exact`, digit segments |
//! | `match` | `exact` or `fuzzy` |
//! | `price_gte`, `price_lte` | `digits(.d{1,2})?`, at most 15 characters |
//! | `range` | `start-end`, `start <= end`, at most 100 rows |
//! | `delivery` | 1-2 digits, one of the allowed values |
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ValidationErrors, Violation};
use crate::normalize::NormalizedParams;
use crate::policy::SearchPolicy;
use crate::types::{is_digits, IndexRange, MatchMode, SearchPattern, SearchQuery, SearchTerm, SearchType};

/// Segments allowed in a `start,contains,end` pattern.
pub const MAX_PATTERN_SEGMENTS: usize = 3;

static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("price pattern is valid"));

/// Validate normalized parameters and produce a typed [`SearchQuery`].
///
/// Returns every failed rule when the request is unacceptable; a request is
/// never half-accepted.
pub fn validate(
    params: &NormalizedParams,
    policy: &SearchPolicy,
) -> Result<SearchQuery, ValidationErrors> {
    let mut violations = Vec::new();

    let search_type = take(&mut violations, check_type(&params.search_type));
    let declared_type = SearchType::parse(&params.search_type);
    let term = take(
        &mut violations,
        check_search(params.search.as_deref(), declared_type, params.match_mode.as_deref(), policy),
    );
    let match_mode = take(&mut violations, check_match(params.match_mode.as_deref()));
    let price_gte = take(
        &mut violations,
        check_price(params.price_gte.as_deref(), "price_gte", policy),
    );
    let price_lte = take(
        &mut violations,
        check_price(params.price_lte.as_deref(), "price_lte", policy),
    );
    let range = take(&mut violations, check_range(params.range.as_deref(), policy));
    let delivery = take(&mut violations, check_delivery(params.delivery.as_deref(), policy));

    if !violations.is_empty() {
        return Err(ValidationErrors::new(violations));
    }

    Ok(SearchQuery {
        search_type,
        term,
        match_mode,
        price_gte,
        price_lte,
        range,
        delivery,
        submitted_search: params.submitted_search.clone(),
        submitted_range: params.submitted_range.clone(),
    })
}

fn take<T: Default>(violations: &mut Vec<Violation>, result: Result<T, Violation>) -> T {
    result.unwrap_or_else(|violation| {
        violations.push(violation);
        T::default()
    })
}

fn check_type(value: &str) -> Result<SearchType, Violation> {
    SearchType::parse(value).ok_or(Violation::InvalidType)
}

fn check_search(
    value: Option<&str>,
    search_type: Option<SearchType>,
    match_mode: Option<&str>,
    policy: &SearchPolicy,
) -> Result<SearchTerm, Violation> {
    let Some(value) = value else {
        return Ok(SearchTerm::Any);
    };

    if policy.multi_part_search && value.contains(',') {
        return check_pattern(value, search_type, match_mode, policy).map(SearchTerm::Pattern);
    }

    if !is_digits(value) {
        return Err(Violation::SearchNotDigits);
    }

    let search_type = search_type.unwrap_or_default();
    let max = if search_type.is_partial() {
        policy.max_partial_search_len
    } else {
        policy.max_search_len
    };
    if value.len() > max {
        return Err(Violation::SearchTooLong {
            max,
            search_type: search_type.as_str().to_string(),
        });
    }

    Ok(SearchTerm::Digits(value.to_string()))
}

fn check_pattern(
    value: &str,
    search_type: Option<SearchType>,
    match_mode: Option<&str>,
    policy: &SearchPolicy,
) -> Result<SearchPattern, Violation> {
    if search_type != Some(SearchType::Number) {
        return Err(Violation::PatternRequiresNumberType);
    }
    if match_mode == Some(MatchMode::Exact.as_str()) {
        return Err(Violation::PatternWithExactMatch);
    }

    let segments: Vec<&str> = value.split(',').collect();
    if segments.len() > MAX_PATTERN_SEGMENTS {
        return Err(Violation::PatternTooManySegments {
            max: MAX_PATTERN_SEGMENTS,
        });
    }
    if segments.iter().all(|segment| segment.is_empty()) {
        return Err(Violation::PatternEmpty);
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        let position = index + 1;
        if !is_digits(segment) {
            return Err(Violation::PatternSegmentNotDigits { position });
        }
        if segment.len() > policy.max_search_len {
            return Err(Violation::PatternSegmentTooLong {
                position,
                max: policy.max_search_len,
            });
        }
    }

    Ok(SearchPattern::new(
        segments.into_iter().map(str::to_string).collect(),
    ))
}

fn check_match(value: Option<&str>) -> Result<MatchMode, Violation> {
    match value {
        None => Ok(MatchMode::Fuzzy),
        Some(value) => MatchMode::parse(value).ok_or(Violation::InvalidMatch),
    }
}

/// Whether a price bound is acceptable under `policy`.
pub fn is_valid_price(value: &str, policy: &SearchPolicy) -> bool {
    value.len() <= policy.max_price_len && PRICE_PATTERN.is_match(value)
}

fn check_price(
    value: Option<&str>,
    param: &'static str,
    policy: &SearchPolicy,
) -> Result<Option<String>, Violation> {
    match value {
        None => Ok(None),
        Some(value) if is_valid_price(value, policy) => Ok(Some(value.to_string())),
        Some(_) => Err(Violation::InvalidPrice {
            param,
            max: policy.max_price_len,
        }),
    }
}

fn check_range(value: Option<&str>, policy: &SearchPolicy) -> Result<Option<IndexRange>, Violation> {
    let Some(value) = value else {
        return Ok(None);
    };

    let (start, end) = value.split_once('-').ok_or(Violation::InvalidRangeFormat)?;
    if !is_digits(start) || !is_digits(end) {
        return Err(Violation::InvalidRangeFormat);
    }
    let start: u64 = start.parse().map_err(|_| Violation::InvalidRangeFormat)?;
    let end: u64 = end.parse().map_err(|_| Violation::InvalidRangeFormat)?;

    let range = IndexRange::new(start, end).ok_or(Violation::RangeReversed)?;
    if let Some(max) = policy.max_range_span {
        if range.row_count() > max {
            return Err(Violation::RangeTooWide { max });
        }
    }
    Ok(Some(range))
}

fn check_delivery(value: Option<&str>, policy: &SearchPolicy) -> Result<Option<String>, Violation> {
    if !policy.delivery_filter {
        return Ok(None);
    }
    let Some(value) = value else {
        return Ok(None);
    };

    if value.len() > 2 {
        return Err(Violation::DeliveryTooLong);
    }
    if !is_digits(value) {
        return Err(Violation::DeliveryNotDigits);
    }
    if !policy.allowed_deliveries.iter().any(|allowed| allowed == value) {
        return Err(Violation::DeliveryNotAllowed {
            allowed: policy.describe_deliveries(),
        });
    }
    Ok(Some(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawSearchParams};

    fn params(pairs: &[(&str, &str)]) -> NormalizedParams {
        let mut raw = RawSearchParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "type" => raw.search_type = value,
                "search" => raw.search = value,
                "match" => raw.match_mode = value,
                "price_gte" => raw.price_gte = value,
                "price_lte" => raw.price_lte = value,
                "range" => raw.range = value,
                "delivery" => raw.delivery = value,
                other => panic!("unknown parameter {other}"),
            }
        }
        normalize(raw)
    }

    fn check(pairs: &[(&str, &str)]) -> Result<SearchQuery, ValidationErrors> {
        validate(&params(pairs), &SearchPolicy::default())
    }

    #[test]
    fn empty_request_is_valid() {
        let query = check(&[]).unwrap();
        assert_eq!(query.search_type, SearchType::Number);
        assert_eq!(query.term, SearchTerm::Any);
        assert_eq!(query.match_mode, MatchMode::Fuzzy);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = check(&[("type", "area")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::InvalidType]);
    }

    #[test]
    fn search_length_depends_on_type() {
        assert!(check(&[("search", "07700900123")]).is_ok());
        let err = check(&[("search", "077009001234")]).unwrap_err();
        assert!(matches!(
            err.violations(),
            [Violation::SearchTooLong { max: 11, .. }]
        ));

        assert!(check(&[("type", "prefix"), ("search", "077009")]).is_ok());
        let err = check(&[("type", "last_six"), ("search", "0770090")]).unwrap_err();
        assert!(matches!(
            err.violations(),
            [Violation::SearchTooLong { max: 6, .. }]
        ));
    }

    #[test]
    fn search_must_be_digits() {
        let err = check(&[("search", "12#4")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::SearchNotDigits]);
    }

    #[test]
    fn letters_are_converted_before_validation() {
        let query = check(&[("search", "taxi")]).unwrap();
        assert_eq!(query.term, SearchTerm::Digits("8294".into()));
        assert_eq!(query.submitted_search.as_deref(), Some("taxi"));
    }

    #[test]
    fn pattern_requires_number_type() {
        let err = check(&[("type", "prefix"), ("search", "1,2")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::PatternRequiresNumberType]);
    }

    #[test]
    fn pattern_rejects_exact_match() {
        let err = check(&[("search", "1,2"), ("match", "exact")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::PatternWithExactMatch]);
    }

    #[test]
    fn pattern_segment_limits() {
        let err = check(&[("search", "1,2,3,4")]).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::PatternTooManySegments { max: 3 }]
        );

        let err = check(&[("search", ",,")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::PatternEmpty]);

        let err = check(&[("search", "1,2x")]).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::PatternSegmentNotDigits { position: 2 }]
        );

        let err = check(&[("search", "1,,123456789012")]).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::PatternSegmentTooLong {
                position: 3,
                max: 11
            }]
        );
    }

    #[test]
    fn pattern_with_trailing_comma_is_a_prefix_pattern() {
        let query = check(&[("search", "0800,")]).unwrap();
        let SearchTerm::Pattern(pattern) = query.term else {
            panic!("expected pattern");
        };
        assert_eq!(pattern.starts_with(), Some("0800"));
        assert_eq!(pattern.contains(), None);
    }

    #[test]
    fn commas_are_plain_characters_when_patterns_disabled() {
        let policy = SearchPolicy {
            multi_part_search: false,
            ..Default::default()
        };
        let err = validate(&params(&[("search", "1,2")]), &policy).unwrap_err();
        assert_eq!(err.violations(), &[Violation::SearchNotDigits]);
    }

    #[test]
    fn match_values() {
        assert_eq!(
            check(&[("match", "exact")]).unwrap().match_mode,
            MatchMode::Exact
        );
        assert_eq!(
            check(&[("match", "fuzzy")]).unwrap().match_mode,
            MatchMode::Fuzzy
        );
        let err = check(&[("match", "loose")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::InvalidMatch]);
    }

    #[test]
    fn price_rules() {
        assert!(check(&[("price_gte", "10"), ("price_lte", "99.95")]).is_ok());
        assert!(check(&[("price_lte", "99.9")]).is_ok());

        let err = check(&[("price_lte", "9.999")]).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::InvalidPrice {
                param: "price_lte",
                max: 15
            }]
        );

        let err = check(&[("price_gte", "1234567890123.45")]).unwrap_err();
        assert_eq!(err.len(), 1);

        let err = check(&[("price_gte", "-1")]).unwrap_err();
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn range_rules() {
        assert_eq!(
            check(&[("range", "0-99")]).unwrap().range,
            IndexRange::new(0, 99)
        );

        let err = check(&[("range", "0-100")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::RangeTooWide { max: 100 }]);

        let err = check(&[("range", "0-150")]).unwrap_err();
        assert_eq!(err.messages(), vec!["range: must not exceed 100 indexes."]);

        let err = check(&[("range", "20-10")]).unwrap_err();
        assert_eq!(err.violations(), &[Violation::RangeReversed]);

        for bad in ["10", "a-b", "1-", "-1", "1-2-3"] {
            let err = check(&[("range", bad)]).unwrap_err();
            assert_eq!(err.violations(), &[Violation::InvalidRangeFormat], "{bad}");
        }
    }

    #[test]
    fn range_cap_can_be_lifted() {
        let policy = SearchPolicy {
            max_range_span: None,
            ..Default::default()
        };
        assert!(validate(&params(&[("range", "0-999")]), &policy).is_ok());
    }

    #[test]
    fn delivery_rules() {
        assert_eq!(
            check(&[("delivery", "7")]).unwrap().delivery.as_deref(),
            Some("7")
        );
        assert_eq!(
            check(&[("delivery", "123")]).unwrap_err().violations(),
            &[Violation::DeliveryTooLong]
        );
        assert_eq!(
            check(&[("delivery", "x")]).unwrap_err().violations(),
            &[Violation::DeliveryNotDigits]
        );
        assert_eq!(
            check(&[("delivery", "3")]).unwrap_err().messages(),
            vec!["delivery: must be 1 or 7."]
        );
    }

    #[test]
    fn delivery_ignored_when_disabled() {
        let policy = SearchPolicy {
            delivery_filter: false,
            ..Default::default()
        };
        let query = validate(&params(&[("delivery", "banana")]), &policy).unwrap();
        assert_eq!(query.delivery, None);
    }

    #[test]
    fn reports_every_failed_rule() {
        let err = check(&[
            ("type", "bogus"),
            ("search", "12a#"),
            ("match", "nope"),
            ("price_gte", "x"),
            ("price_lte", "y"),
            ("range", "5-1"),
            ("delivery", "9"),
        ])
        .unwrap_err();
        assert_eq!(err.len(), 7);
        assert_eq!(err.violations()[0], Violation::InvalidType);
        assert_eq!(err.violations()[5], Violation::RangeReversed);
    }
}
