//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the business and
//! operator as headers and every cash route requires both.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use octo_core::validation::validate_actor_id;

use crate::error::ApiError;

pub const BUSINESS_HEADER: &str = "x-business-id";
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// The business and operator a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorContext {
    pub business_id: String,
    pub operator_id: String,
}

impl<S> FromRequestParts<S> for OperatorContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let business_id = header(parts, BUSINESS_HEADER)?;
        let operator_id = header(parts, OPERATOR_HEADER)?;
        Ok(OperatorContext {
            business_id,
            operator_id,
        })
    }
}

fn header(parts: &Parts, name: &str) -> Result<String, ApiError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    validate_actor_id(name, value)
        .map_err(|e| ApiError::unauthenticated(format!("Missing or invalid identity: {}", e)))?;

    Ok(value.to_string())
}
