//! Partner API-key authentication.
//!
//! Keys are never sent upstream in clear: the SHA-256 hex digest is passed to
//! a verification RPC that resolves it to a partner id.

use crate::error::ServerError;
use crate::rest::RestError;
use crate::state::ServerState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The partner an API key resolved to, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerIdentity(pub String);

impl PartnerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extracts the partner set by the auth middleware, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaybePartner(pub Option<PartnerIdentity>);

impl MaybePartner {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_ref().map(PartnerIdentity::as_str)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybePartner {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePartner(parts.extensions.get::<PartnerIdentity>().cloned()))
    }
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Accepts `"id"`, `{"partner_id": "id"}`, or an array whose first element
/// is either.
pub fn partner_from_rpc(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(map) => map.get("partner_id").and_then(partner_from_rpc),
        Value::Array(items) => items.first().and_then(partner_from_rpc),
        _ => None,
    }
}

/// Resolve `key` through the verification RPC.
pub async fn verify_api_key(state: &ServerState, key: &str) -> Result<PartnerIdentity, ServerError> {
    let args = json!({ "p_key_hash": hash_api_key(key) });
    let reply = state
        .data_api
        .call_rpc(&state.config.verify_key_rpc, &args)
        .await
        .map_err(|err| match err {
            RestError::Transport(detail) => {
                tracing::warn!(error = %detail, "api_key_verification_unreachable");
                ServerError::BadGateway("Unable to verify credentials. Please try again.".into())
            }
            other => {
                tracing::warn!(error = %other, "api_key_verification_rejected");
                ServerError::Unauthorized
            }
        })?;

    partner_from_rpc(&reply)
        .map(PartnerIdentity)
        .ok_or(ServerError::InvalidApiKey)
}

fn api_key(request: &Request) -> Option<String> {
    request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// Reject requests without a valid partner key.
pub async fn require_partner(
    State(state): State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let key = api_key(&request).ok_or(ServerError::MissingApiKey)?;
    let partner = verify_api_key(&state, &key).await?;
    tracing::debug!(partner_id = %partner.as_str(), "partner_authenticated");
    request.extensions_mut().insert(partner);
    Ok(next.run(request).await)
}

/// Let anonymous requests through unless the server requires keys for
/// searches. A key that is present must still be valid.
pub async fn optional_partner(
    State(state): State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    match api_key(&request) {
        Some(key) => {
            let partner = verify_api_key(&state, &key).await?;
            request.extensions_mut().insert(partner);
        }
        None if state.config.search_requires_api_key => return Err(ServerError::MissingApiKey),
        None => {}
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn rpc_shapes_resolve_to_partner() {
        assert_eq!(partner_from_rpc(&json!("acme")).as_deref(), Some("acme"));
        assert_eq!(
            partner_from_rpc(&json!({"partner_id": "acme"})).as_deref(),
            Some("acme")
        );
        assert_eq!(
            partner_from_rpc(&json!([{"partner_id": "acme"}])).as_deref(),
            Some("acme")
        );
        assert_eq!(partner_from_rpc(&json!(["acme"])).as_deref(), Some("acme"));
    }

    #[test]
    fn empty_rpc_replies_resolve_to_nothing() {
        assert_eq!(partner_from_rpc(&Value::Null), None);
        assert_eq!(partner_from_rpc(&json!([])), None);
        assert_eq!(partner_from_rpc(&json!("")), None);
        assert_eq!(partner_from_rpc(&json!({"partner_id": null})), None);
        assert_eq!(partner_from_rpc(&json!(42)), None);
    }
}
