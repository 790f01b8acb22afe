//! Body parsing for purchase requests.
//!
//! Two encodings are accepted:
//!
//! - `application/json`: `{"partnerId": "...", "email": "...", "items": [{"number": "...", "provision": "PAC"}]}`
//! - `application/x-www-form-urlencoded`: `partnerId=...&items.number[0]=...&items.provision[0]=...`
//!
//! Form items are gathered by index and returned in ascending index order.
//! An empty form body falls back to the query string.
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::types::RawPurchase;

static FORM_ITEM_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^items\.(number|provision)\[(\d+)\]$").expect("form item pattern is valid")
});

/// Supported request encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

impl BodyKind {
    /// Media type from a `Content-Type` header value, ignoring parameters.
    pub fn from_content_type(content_type: Option<&str>) -> Result<Self, ParseError> {
        let media_type = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match media_type.as_str() {
            "application/json" => Ok(Self::Json),
            "application/x-www-form-urlencoded" => Ok(Self::Form),
            _ => Err(ParseError::UnsupportedMediaType),
        }
    }
}

/// Parse a request body according to its `Content-Type`.
///
/// `query` is the raw query string, consulted only for empty form bodies.
pub fn parse_body(
    content_type: Option<&str>,
    body: &[u8],
    query: Option<&str>,
) -> Result<RawPurchase, ParseError> {
    match BodyKind::from_content_type(content_type)? {
        BodyKind::Json => parse_json(body),
        BodyKind::Form => {
            let body = std::str::from_utf8(body)
                .map_err(|err| ParseError::InvalidBody(err.to_string()))?;
            if body.is_empty() {
                parse_form(query.unwrap_or_default())
            } else {
                parse_form(body)
            }
        }
    }
}

pub fn parse_json(body: &[u8]) -> Result<RawPurchase, ParseError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| ParseError::InvalidBody(err.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(ParseError::InvalidBody("expected a JSON object".to_string()));
    };

    let items = match object.remove("items") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    Ok(RawPurchase {
        partner_id: object.remove("partnerId").unwrap_or(Value::Null),
        email: object.remove("email").unwrap_or(Value::Null),
        items,
    })
}

pub fn parse_form(encoded: &str) -> Result<RawPurchase, ParseError> {
    let pairs: Vec<(String, String)> = serde_html_form::from_str(encoded)
        .map_err(|err| ParseError::InvalidBody(err.to_string()))?;

    let mut partner_id = None;
    let mut email = None;
    let mut items: BTreeMap<usize, Map<String, Value>> = BTreeMap::new();

    for (key, value) in pairs {
        match key.as_str() {
            "partnerId" => {
                partner_id.get_or_insert(value);
            }
            "email" => {
                email.get_or_insert(value);
            }
            _ => {
                let Some(captures) = FORM_ITEM_KEY.captures(&key) else {
                    continue;
                };
                let Ok(index) = captures[2].parse::<usize>() else {
                    continue;
                };
                let item = items.entry(index).or_insert_with(|| {
                    Map::from_iter([
                        ("number".to_string(), Value::Null),
                        ("provision".to_string(), Value::Null),
                    ])
                });
                item.insert(captures[1].to_string(), Value::String(value));
            }
        }
    }

    Ok(RawPurchase {
        partner_id: partner_id.map(Value::String).unwrap_or(Value::Null),
        email: email.map(Value::String).unwrap_or(Value::Null),
        items: items.into_values().map(Value::Object).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_type_ignores_parameters_and_case() {
        assert_eq!(
            BodyKind::from_content_type(Some("Application/JSON; charset=utf-8")),
            Ok(BodyKind::Json)
        );
        assert_eq!(
            BodyKind::from_content_type(Some("application/x-www-form-urlencoded")),
            Ok(BodyKind::Form)
        );
        assert_eq!(
            BodyKind::from_content_type(Some("text/plain")),
            Err(ParseError::UnsupportedMediaType)
        );
        assert_eq!(
            BodyKind::from_content_type(None),
            Err(ParseError::UnsupportedMediaType)
        );
    }

    #[test]
    fn json_body() {
        let raw = parse_json(
            br#"{"partnerId": "acme", "items": [{"number": "07700900123", "provision": "SIM"}]}"#,
        )
        .unwrap();
        assert_eq!(raw.partner_id(), Some("acme"));
        assert_eq!(raw.email, Value::Null);
        assert_eq!(raw.items, vec![json!({"number": "07700900123", "provision": "SIM"})]);
    }

    #[test]
    fn json_items_must_be_array() {
        let raw = parse_json(br#"{"partnerId": "acme", "items": "07700900123"}"#).unwrap();
        assert!(raw.items.is_empty());
    }

    #[test]
    fn malformed_json_is_invalid_body() {
        assert!(matches!(parse_json(b"{"), Err(ParseError::InvalidBody(_))));
        assert!(matches!(parse_json(b"[]"), Err(ParseError::InvalidBody(_))));
    }

    #[test]
    fn form_items_ordered_by_index() {
        let raw = parse_form(
            "partnerId=acme&items.number[10]=333&items.provision[2]=SIM&items.number[2]=222&email=a%40b.co",
        )
        .unwrap();
        assert_eq!(raw.partner_id(), Some("acme"));
        assert_eq!(raw.email, json!("a@b.co"));
        assert_eq!(
            raw.items,
            vec![
                json!({"number": "222", "provision": "SIM"}),
                json!({"number": "333", "provision": null}),
            ]
        );
    }

    #[test]
    fn form_keeps_first_partner_id() {
        let raw = parse_form("partnerId=first&partnerId=second").unwrap();
        assert_eq!(raw.partner_id(), Some("first"));
    }

    #[test]
    fn empty_form_body_reads_query_string() {
        let raw = parse_body(
            Some("application/x-www-form-urlencoded"),
            b"",
            Some("partnerId=acme&items.number[0]=07700900123"),
        )
        .unwrap();
        assert_eq!(raw.partner_id(), Some("acme"));
        assert_eq!(raw.items.len(), 1);
    }

    #[test]
    fn unrelated_form_keys_are_ignored() {
        let raw = parse_form("items.colour[0]=red&items.number[x]=1").unwrap();
        assert!(raw.items.is_empty());
    }
}
