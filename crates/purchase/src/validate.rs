//! Purchase request checks.
//!
//! Ownership and size are checked first and fail fast. The field rules then
//! run together so the caller sees every problem in one response. Within the
//! item list only the first failing item is reported.
use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::PurchaseError;
use crate::policy::PurchasePolicy;
use crate::types::{Provision, PurchaseItem, PurchaseRequest, RawPurchase};

static PARTNER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9-]+$").expect("partner id pattern is valid"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._+-]+@[a-zA-Z0-9._+-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is valid")
});

/// Check a parsed purchase against the authenticated partner and `policy`.
pub fn prepare_purchase(
    raw: RawPurchase,
    authenticated_partner: &str,
    policy: &PurchasePolicy,
) -> Result<PurchaseRequest, PurchaseError> {
    let claimed = match &raw.partner_id {
        Value::Null => return Err(PurchaseError::MissingPartner),
        Value::String(id) if id.is_empty() => return Err(PurchaseError::MissingPartner),
        Value::String(id) => id,
        _ => return Err(PurchaseError::PartnerMismatch),
    };
    if claimed != authenticated_partner {
        return Err(PurchaseError::PartnerMismatch);
    }
    if raw.items.len() > policy.max_items {
        return Err(PurchaseError::TooManyItems {
            max: policy.max_items,
        });
    }

    let mut messages = Vec::new();
    if let Err(message) = check_partner_id(claimed, policy) {
        messages.push(message);
    }
    let items = match check_items(&raw.items, policy) {
        Ok(items) => items,
        Err(message) => {
            messages.push(message);
            Vec::new()
        }
    };
    let email = match check_email(&raw.email, policy) {
        Ok(email) => email,
        Err(message) => {
            messages.push(message);
            None
        }
    };
    if !messages.is_empty() {
        debug!(partner_id = %claimed, violations = messages.len(), "purchase_rejected");
        return Err(PurchaseError::Invalid(messages));
    }

    let requested = items.len();
    let items = dedupe(items);
    debug!(
        partner_id = %claimed,
        requested,
        unique = items.len(),
        "purchase_prepared"
    );
    Ok(PurchaseRequest {
        partner_id: claimed.clone(),
        email,
        items,
    })
}

fn check_partner_id(id: &str, policy: &PurchasePolicy) -> Result<(), String> {
    if id.chars().count() > policy.max_partner_id_len {
        return Err(format!(
            "partnerId: must be at most {} characters.",
            policy.max_partner_id_len
        ));
    }
    if !PARTNER_ID.is_match(id) {
        return Err("partnerId: only letters, numbers, and dashes allowed.".to_string());
    }
    Ok(())
}

fn check_items(items: &[Value], policy: &PurchasePolicy) -> Result<Vec<PurchaseItem>, String> {
    if items.is_empty() {
        return Err("items: at least one item (with number) is required.".to_string());
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| check_item(index, item, policy))
        .collect()
}

fn check_item(index: usize, item: &Value, policy: &PurchasePolicy) -> Result<PurchaseItem, String> {
    let Value::Object(fields) = item else {
        return Err(format!(
            "items[{index}]: must be an object with number and optional provision."
        ));
    };

    let number = match fields.get("number") {
        None | Some(Value::Null) => return Err(format!("items[{index}].number: is required.")),
        Some(Value::String(number)) if number.is_empty() => {
            return Err(format!("items[{index}].number: is required."))
        }
        Some(Value::String(number)) => number,
        Some(_) => return Err(format!("items[{index}].number: must be a string.")),
    };
    if number.chars().count() > policy.max_number_len {
        return Err(format!(
            "items[{index}].number: must be at most {} characters.",
            policy.max_number_len
        ));
    }
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!(
            "items[{index}].number: must contain only digits (0-9)."
        ));
    }

    let provision = match fields.get("provision") {
        None | Some(Value::Null) => Provision::default(),
        Some(Value::String(provision)) if provision.is_empty() => Provision::default(),
        Some(Value::String(provision)) => {
            if provision.chars().count() > 3 {
                return Err(format!(
                    "items[{index}].provision: must be at most 3 characters."
                ));
            }
            Provision::parse(provision).ok_or_else(|| {
                format!("items[{index}].provision: must be PAC or SIM when provided.")
            })?
        }
        Some(_) => {
            return Err(format!(
                "items[{index}].provision: must be a string when provided."
            ))
        }
    };

    Ok(PurchaseItem {
        number: number.clone(),
        provision,
    })
}

fn check_email(email: &Value, policy: &PurchasePolicy) -> Result<Option<String>, String> {
    let email = match email {
        Value::Null => return Ok(None),
        Value::String(email) if email.is_empty() => return Ok(None),
        Value::String(email) => email,
        _ => return Err("email: must be a string.".to_string()),
    };
    if email.chars().count() > policy.max_email_len {
        return Err(format!(
            "email: maximum length is {} characters.",
            policy.max_email_len
        ));
    }
    if !EMAIL.is_match(email) {
        return Err(r#"email: must be a valid email; only letters, numbers, and ".", "_", "-", "+", "@" special characters allowed."#.to_string());
    }
    Ok(Some(email.clone()))
}

/// Drop repeated numbers, keeping the first occurrence and its provision.
pub fn dedupe(items: Vec<PurchaseItem>) -> Vec<PurchaseItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.number.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(body: Value) -> RawPurchase {
        crate::parse::parse_json(body.to_string().as_bytes()).unwrap()
    }

    fn prepare(body: Value) -> Result<PurchaseRequest, PurchaseError> {
        prepare_purchase(raw(body), "acme", &PurchasePolicy::default())
    }

    #[test]
    fn accepts_minimal_purchase() {
        let request = prepare(json!({
            "partnerId": "acme",
            "items": [{"number": "07700900123"}]
        }))
        .unwrap();
        assert_eq!(request.partner_id, "acme");
        assert_eq!(request.email, None);
        assert_eq!(request.items[0].provision, Provision::Pac);
    }

    #[test]
    fn partner_checks_come_first() {
        assert_eq!(
            prepare(json!({"items": []})),
            Err(PurchaseError::MissingPartner)
        );
        assert_eq!(
            prepare(json!({"partnerId": "", "items": []})),
            Err(PurchaseError::MissingPartner)
        );
        assert_eq!(
            prepare(json!({"partnerId": "other", "items": []})),
            Err(PurchaseError::PartnerMismatch)
        );
        assert_eq!(
            prepare(json!({"partnerId": 7, "items": []})),
            Err(PurchaseError::PartnerMismatch)
        );
    }

    #[test]
    fn item_count_checked_before_fields() {
        let items: Vec<Value> = (0..101).map(|_| json!({"number": "bad"})).collect();
        assert_eq!(
            prepare(json!({"partnerId": "acme", "items": items})),
            Err(PurchaseError::TooManyItems { max: 100 })
        );
    }

    #[test]
    fn reports_all_fields_but_first_item_only() {
        let err = prepare_purchase(
            raw(json!({
                "partnerId": "acme",
                "email": "not-an-email",
                "items": [{"number": "12ab"}, {"number": 5}]
            })),
            "acme",
            &PurchasePolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.messages(),
            &[
                "items[0].number: must contain only digits (0-9).".to_string(),
                r#"email: must be a valid email; only letters, numbers, and ".", "_", "-", "+", "@" special characters allowed."#.to_string(),
            ]
        );
    }

    #[test]
    fn partner_id_pattern_and_length() {
        let long = "a".repeat(51);
        let err = prepare_purchase(
            raw(json!({"partnerId": long, "items": [{"number": "1"}]})),
            &long,
            &PurchasePolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err.messages(), &["partnerId: must be at most 50 characters.".to_string()]);

        let err = prepare_purchase(
            raw(json!({"partnerId": "ac me", "items": [{"number": "1"}]})),
            "ac me",
            &PurchasePolicy::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.messages(),
            &["partnerId: only letters, numbers, and dashes allowed.".to_string()]
        );
    }

    #[test]
    fn item_rules() {
        let cases = [
            (json!("07700900123"), "items[0]: must be an object with number and optional provision."),
            (json!({"number": ""}), "items[0].number: is required."),
            (json!({"number": "123456789012"}), "items[0].number: must be at most 11 characters."),
            (json!({"number": "1", "provision": "ESIM"}), "items[0].provision: must be at most 3 characters."),
            (json!({"number": "1", "provision": "pac"}), "items[0].provision: must be PAC or SIM when provided."),
            (json!({"number": "1", "provision": 1}), "items[0].provision: must be a string when provided."),
        ];
        for (item, expected) in cases {
            let err = prepare(json!({"partnerId": "acme", "items": [item]})).unwrap_err();
            assert_eq!(err.messages(), &[expected.to_string()]);
        }
    }

    #[test]
    fn empty_items_rejected() {
        let err = prepare(json!({"partnerId": "acme", "items": []})).unwrap_err();
        assert_eq!(
            err.messages(),
            &["items: at least one item (with number) is required.".to_string()]
        );
    }

    #[test]
    fn duplicates_keep_first_provision() {
        let request = prepare(json!({
            "partnerId": "acme",
            "email": "ops@acme.co.uk",
            "items": [
                {"number": "111", "provision": "SIM"},
                {"number": "222"},
                {"number": "111", "provision": "PAC"}
            ]
        }))
        .unwrap();
        assert_eq!(request.numbers(), vec!["111", "222"]);
        assert_eq!(request.items[0].provision, Provision::Sim);
        assert_eq!(request.email.as_deref(), Some("ops@acme.co.uk"));
    }
}
