//! Availability reconciliation and the webhook exchange.
//!
//! The lookup returns only rows that are still available. Every requested
//! number missing from it makes the purchase fail: with 404 when nothing is
//! left, 409 when the caller should resubmit a smaller order. Only a fully
//! available order reaches the webhook.
use std::collections::HashMap;

use search::{Filter, FilterOp};
use serde::Serialize;
use serde_json::Value;

use crate::types::{AvailableNumber, Provision, PurchaseRequest};

/// Columns read by the availability lookup.
pub const LOOKUP_COLUMNS: &str = "number,price,t1,t2,delivery";

/// Product type reported for every item.
pub const ITEM_TYPE: &str = "memorable";

/// `number=in.(...)` and `available=eq.true` for the lookup query string.
pub fn availability_filters(request: &PurchaseRequest) -> Vec<Filter> {
    let numbers = request.items.iter().map(|item| item.number.clone()).collect();
    vec![
        Filter::new("number", FilterOp::In(numbers)),
        Filter::available(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Available,
    Unavailable,
    Processing,
}

/// An item enriched with its pricing row.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub number: String,
    pub provision: Provision,
    pub delivery: Value,
    pub rrp: Value,
    pub t1: Value,
    pub t2: Value,
}

impl PricedItem {
    fn new(number: &str, provision: Provision, row: &AvailableNumber) -> Self {
        Self {
            number: number.to_string(),
            provision,
            delivery: row.delivery.clone(),
            rrp: row.price.clone(),
            t1: row.t1.clone(),
            t2: row.t2.clone(),
        }
    }

    fn status(&self, state: ItemState) -> ItemStatus {
        ItemStatus {
            number: self.number.clone(),
            provision: self.provision,
            delivery: self.delivery.clone(),
            item_type: ITEM_TYPE,
            price: self.rrp.clone(),
            t1: self.t1.clone(),
            t2: self.t2.clone(),
            status: state,
        }
    }
}

/// Per-item line in a purchase response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStatus {
    pub number: String,
    pub provision: Provision,
    pub delivery: Value,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub price: Value,
    pub t1: Value,
    pub t2: Value,
    pub status: ItemState,
}

impl ItemStatus {
    fn unavailable(number: &str, provision: Provision) -> Self {
        Self {
            number: number.to_string(),
            provision,
            delivery: Value::Null,
            item_type: ITEM_TYPE,
            price: Value::Null,
            t1: Value::Null,
            t2: Value::Null,
            status: ItemState::Unavailable,
        }
    }
}

/// Body returned when some or all numbers are gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableReport {
    pub status: u16,
    pub message: &'static str,
    pub available: Vec<String>,
    pub unavailable: Vec<String>,
    pub items: Vec<ItemStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Every number is available, in request order.
    Available(Vec<PricedItem>),
    Unavailable(UnavailableReport),
}

/// Compare the request with the lookup rows.
pub fn reconcile(request: &PurchaseRequest, rows: Vec<AvailableNumber>) -> Reconciliation {
    let found: HashMap<&str, &AvailableNumber> =
        rows.iter().map(|row| (row.number.as_str(), row)).collect();

    let missing: Vec<String> = request
        .items
        .iter()
        .filter(|item| !found.contains_key(item.number.as_str()))
        .map(|item| item.number.clone())
        .collect();

    if missing.is_empty() {
        let priced = request
            .items
            .iter()
            .filter_map(|item| {
                found
                    .get(item.number.as_str())
                    .map(|row| PricedItem::new(&item.number, item.provision, row))
            })
            .collect();
        return Reconciliation::Available(priced);
    }

    let items = request
        .items
        .iter()
        .map(|item| match found.get(item.number.as_str()) {
            Some(row) => PricedItem::new(&item.number, item.provision, row).status(ItemState::Available),
            None => ItemStatus::unavailable(&item.number, item.provision),
        })
        .collect();

    let (status, message) = if missing.len() == request.items.len() {
        (404, "All requested numbers are not available for purchase.")
    } else {
        (
            409,
            "One or more numbers are not available for purchase. Resubmit the request with the available numbers only.",
        )
    };

    Reconciliation::Unavailable(UnavailableReport {
        status,
        message,
        available: available_numbers(&rows),
        unavailable: missing,
        items,
    })
}

fn available_numbers(rows: &[AvailableNumber]) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        if !numbers.contains(&row.number) {
            numbers.push(row.number.clone());
        }
    }
    numbers
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookItem {
    pub number: String,
    pub provision: Provision,
    pub delivery: Value,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub rrp: Value,
    pub t1: Value,
    pub t2: Value,
}

/// Order forwarded to the purchase webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub partner_id: String,
    pub email: Option<String>,
    pub numbers: Vec<String>,
    pub items: Vec<WebhookItem>,
}

impl WebhookPayload {
    pub fn new(request: &PurchaseRequest, priced: &[PricedItem]) -> Self {
        Self {
            partner_id: request.partner_id.clone(),
            email: request.email.clone(),
            numbers: priced.iter().map(|item| item.number.clone()).collect(),
            items: priced
                .iter()
                .map(|item| WebhookItem {
                    number: item.number.clone(),
                    provision: item.provision,
                    delivery: item.delivery.clone(),
                    item_type: ITEM_TYPE,
                    rrp: item.rrp.clone(),
                    t1: item.t1.clone(),
                    t2: item.t2.clone(),
                })
                .collect(),
        }
    }
}

/// Interpret the webhook's reply body.
///
/// A body declared as JSON must parse, otherwise it is dropped. Undeclared
/// bodies are parsed when possible and kept as text when not.
pub fn webhook_message(content_type: Option<&str>, text: &str) -> Value {
    let declared_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if text.is_empty() {
        return if declared_json {
            Value::Null
        } else {
            Value::String(String::new())
        };
    }
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) if declared_json => Value::Null,
        Err(_) => Value::String(text.to_string()),
    }
}

/// Response relayed to the partner after the webhook answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub status: u16,
    pub message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemStatus>>,
}

impl Confirmation {
    /// Item detail is attached only when the webhook accepted the order.
    pub fn new(status: u16, message: Value, priced: &[PricedItem]) -> Self {
        if !(200..300).contains(&status) {
            return Self {
                status,
                message,
                available: None,
                unavailable: None,
                items: None,
            };
        }
        Self {
            status,
            message,
            available: Some(priced.iter().map(|item| item.number.clone()).collect()),
            unavailable: Some(Vec::new()),
            items: Some(
                priced
                    .iter()
                    .map(|item| item.status(ItemState::Processing))
                    .collect(),
            ),
        }
    }
}
