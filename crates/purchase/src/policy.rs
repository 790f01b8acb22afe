use serde::{Deserialize, Serialize};

/// Limits for the purchase endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchasePolicy {
    /// Largest accepted `Content-Length`, in bytes.
    pub max_body_bytes: u64,
    /// Most items one request may carry, counted before de-duplication.
    pub max_items: usize,
    pub max_partner_id_len: usize,
    pub max_email_len: usize,
    /// Longest number accepted per item.
    pub max_number_len: usize,
}

impl Default for PurchasePolicy {
    fn default() -> Self {
        Self {
            max_body_bytes: 20_000,
            max_items: 100,
            max_partner_id_len: 50,
            max_email_len: 100,
            max_number_len: 11,
        }
    }
}

impl PurchasePolicy {
    /// Name of the first limit that is zero, if any.
    pub fn zero_limit(&self) -> Option<&'static str> {
        [
            ("max_body_bytes", self.max_body_bytes == 0),
            ("max_items", self.max_items == 0),
            ("max_partner_id_len", self.max_partner_id_len == 0),
            ("max_email_len", self.max_email_len == 0),
            ("max_number_len", self.max_number_len == 0),
        ]
        .into_iter()
        .find_map(|(field, zero)| zero.then_some(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_limits() {
        let policy = PurchasePolicy::default();
        assert_eq!(policy.max_body_bytes, 20_000);
        assert_eq!(policy.max_items, 100);
        assert_eq!(policy.zero_limit(), None);
    }

    #[test]
    fn detects_zero_limits() {
        let policy = PurchasePolicy {
            max_items: 0,
            ..Default::default()
        };
        assert_eq!(policy.zero_limit(), Some("max_items"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let policy: PurchasePolicy = serde_json::from_str(r#"{"max_items": 5}"#).unwrap();
        assert_eq!(policy.max_items, 5);
        assert_eq!(policy.max_email_len, 100);
    }
}
