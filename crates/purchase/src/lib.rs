//! Partner purchases of memorable numbers.
//!
//! Everything between the raw request body and the webhook call lives here,
//! with no I/O:
//!
//! - [`parse_body`] reads JSON or form-encoded bodies into a [`RawPurchase`];
//! - [`prepare_purchase`] checks ownership, size, and field rules, then
//!   de-duplicates the numbers;
//! - [`availability_filters`] describes the lookup of still-available numbers;
//! - [`reconcile`] decides between 404, 409, and forwarding the order as a
//!   [`WebhookPayload`];
//! - [`Confirmation`] shapes the reply relayed from the webhook.
//!
//! ```
//! use purchase::{parse_body, prepare_purchase, PurchasePolicy};
//!
//! let raw = parse_body(
//!     Some("application/x-www-form-urlencoded"),
//!     b"partnerId=acme&items.number[0]=07700900123&items.provision[0]=SIM",
//!     None,
//! )
//! .unwrap();
//! let request = prepare_purchase(raw, "acme", &PurchasePolicy::default()).unwrap();
//! assert_eq!(request.numbers(), vec!["07700900123"]);
//! ```
mod error;
mod parse;
mod policy;
mod reconcile;
mod types;
mod validate;

pub use crate::error::{ParseError, PurchaseError};
pub use crate::parse::{parse_body, parse_form, parse_json, BodyKind};
pub use crate::policy::PurchasePolicy;
pub use crate::reconcile::{
    availability_filters, reconcile, webhook_message, Confirmation, ItemState, ItemStatus,
    PricedItem, Reconciliation, UnavailableReport, WebhookItem, WebhookPayload, ITEM_TYPE,
    LOOKUP_COLUMNS,
};
pub use crate::types::{AvailableNumber, Provision, PurchaseItem, PurchaseRequest, RawPurchase};
pub use crate::validate::{dedupe, prepare_purchase};
