use thiserror::Error;

/// The request body could not be turned into purchase parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Content-Type must be application/json or application/x-www-form-urlencoded.")]
    UnsupportedMediaType,

    #[error("Invalid request body (expected JSON or form-urlencoded): {0}")]
    InvalidBody(String),
}

/// The request parsed but cannot be accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("partnerId is required and must match the authenticated API key.")]
    MissingPartner,

    #[error("The API key is not authorised for the specified partner.")]
    PartnerMismatch,

    #[error("Too many items: The maximum number of items allowed per request is {max}.")]
    TooManyItems { max: usize },

    #[error("{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

impl PurchaseError {
    /// Individual validation messages; empty for the other variants.
    pub fn messages(&self) -> &[String] {
        match self {
            PurchaseError::Invalid(messages) => messages,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_joins_messages() {
        let err = PurchaseError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "a\nb");
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn too_many_items_names_limit() {
        let err = PurchaseError::TooManyItems { max: 100 };
        assert!(err.to_string().ends_with("is 100."));
        assert!(err.messages().is_empty());
    }
}
