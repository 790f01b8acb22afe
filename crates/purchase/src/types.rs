use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the partner wants the number delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provision {
    /// Port into an existing line.
    #[default]
    #[serde(rename = "PAC")]
    Pac,
    #[serde(rename = "SIM")]
    Sim,
}

impl Provision {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PAC" => Some(Self::Pac),
            "SIM" => Some(Self::Sim),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pac => "PAC",
            Self::Sim => "SIM",
        }
    }
}

impl fmt::Display for Provision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters as parsed from the body, before any rule is applied.
///
/// Fields stay as JSON values so the validator can tell a missing value from
/// one of the wrong type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPurchase {
    pub partner_id: Value,
    pub email: Value,
    pub items: Vec<Value>,
}

impl RawPurchase {
    /// The partner id when it is a non-empty string.
    pub fn partner_id(&self) -> Option<&str> {
        self.partner_id.as_str().filter(|id| !id.is_empty())
    }
}

/// One number to buy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PurchaseItem {
    pub number: String,
    pub provision: Provision,
}

/// A validated, de-duplicated purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub partner_id: String,
    pub email: Option<String>,
    /// Unique numbers in first-seen order.
    pub items: Vec<PurchaseItem>,
}

impl PurchaseRequest {
    pub fn numbers(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.number.as_str()).collect()
    }
}

/// A row from the availability lookup.
///
/// Pricing columns are passed through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AvailableNumber {
    pub number: String,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub t1: Value,
    #[serde(default)]
    pub t2: Value,
    #[serde(default)]
    pub delivery: Value,
}
