use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use numbers_api::PipelineError;
use purchase::{ParseError, PurchaseError};
use search::ValidationErrors;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// `Display` is the message sent to callers, so upstream detail never
/// appears in it.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Unauthorized: request was not successful because it lacks valid authentication credentials for the requested resource.")]
    MissingApiKey,

    #[error("The credentials provided are not valid for the specified partner. Please contact support.")]
    Unauthorized,

    #[error("Unauthorized: The API key provided is invalid or inactive.")]
    InvalidApiKey,

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid search parameters.")]
    Validation(ValidationErrors),

    #[error("Invalid purchase parameters.")]
    InvalidParams(Vec<String>),

    #[error("Invalid request body (expected JSON or form-urlencoded).")]
    InvalidBody(String),

    #[error("Content-Type must be application/json or application/x-www-form-urlencoded.")]
    UnsupportedMediaType,

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("An unexpected error occurred. Please try again.")]
    Internal(String),

    #[error("Service misconfigured")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::MissingApiKey | ServerError::Unauthorized | ServerError::InvalidApiKey => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::Validation(_)
            | ServerError::InvalidParams(_)
            | ServerError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ServerError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ServerError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::MissingApiKey => "MISSING_API_KEY",
            ServerError::Unauthorized => "UNAUTHORIZED",
            ServerError::InvalidApiKey => "INVALID_API_KEY",
            ServerError::Forbidden(_) => "FORBIDDEN",
            ServerError::Validation(_) | ServerError::InvalidParams(_) => "INVALID_PARAMS",
            ServerError::InvalidBody(_) => "INVALID_BODY",
            ServerError::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ServerError::BadGateway(_) => "BAD_GATEWAY",
            ServerError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::Validation(errors) => Some(errors.messages().into()),
            ServerError::InvalidParams(messages) => Some(messages.clone().into()),
            ServerError::InvalidBody(detail) => Some(detail.clone().into()),
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ServerError::Internal(detail) | ServerError::Config(detail) => {
                tracing::error!(code = self.error_code(), detail = %detail, "request_failed");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(err: ValidationErrors) -> Self {
        ServerError::Validation(err)
    }
}

impl From<PurchaseError> for ServerError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::MissingPartner | PurchaseError::PartnerMismatch => {
                ServerError::Forbidden(err.to_string())
            }
            PurchaseError::TooManyItems { .. } => ServerError::PayloadTooLarge(err.to_string()),
            PurchaseError::Invalid(messages) => ServerError::InvalidParams(messages),
        }
    }
}

impl From<ParseError> for ServerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsupportedMediaType => ServerError::UnsupportedMediaType,
            ParseError::InvalidBody(detail) => ServerError::InvalidBody(detail),
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(errors) => errors.into(),
            PipelineError::Purchase(err) => err.into(),
            PipelineError::Policy(err) => ServerError::Config(err.to_string()),
        }
    }
}
