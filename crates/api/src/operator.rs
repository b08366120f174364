//! Operator identity extraction.
//!
//! Session handling lives outside this service; the front door forwards
//! the acting operator in a header, and billing operations stamp it on
//! charges, settlements, and repairs when present.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the operator identifier, when the caller has one.
pub const OPERATOR_HEADER: &str = "x-operator-id";

#[derive(Debug, Clone, Default)]
pub struct OperatorContext {
    pub operator_id: Option<String>,
}

impl OperatorContext {
    pub fn as_deref(&self) -> Option<&str> {
        self.operator_id.as_deref()
    }
}

impl<S> FromRequestParts<S> for OperatorContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operator_id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(Self { operator_id })
    }
}
