//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Cash API                           │
//! │                                                                         │
//! │  Operator UI                 Rust Backend                               │
//! │  ───────────                 ────────────                               │
//! │                                                                         │
//! │  POST /cash/{id}/close                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage failure? ─── DbError::QueryFailed("...") ──┐           │  │
//! │  │         │                  (logged, generic message) │           │  │
//! │  │         ▼                                            ▼           │  │
//! │  │  Rule violation? ─── CoreError::ReasonRequired ──── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄─── 422 { "code": "REASON_REQUIRED", "message": "...",               │
//! │             "details": { "difference_cents": -5000, ... } }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use octo_core::{CoreError, ValidationError};
use octo_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// This is what the client receives when a request fails:
/// ```json
/// {
///   "code": "ALREADY_OPEN",
///   "message": "Register 3f2a... is already open; close it before opening a new one",
///   "details": { "register_id": "3f2a...", "expired": false }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured context for codes the UI reacts to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Business already has an open register (409)
    AlreadyOpen,

    /// Register is closed, expired under a blocking policy, or missing (409)
    NotOpen,

    /// Opening amount or counted cash out of range (422)
    InvalidAmount,

    /// Movement breaks a ledger rule (422)
    InvalidMovement,

    /// Close needs a difference reason (422)
    ReasonRequired,

    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing or malformed identity headers (401)
    Unauthenticated,

    /// Lost a race; the client may retry (503)
    Transient,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::AlreadyOpen | ErrorCode::NotOpen => StatusCode::CONFLICT,
            ErrorCode::InvalidAmount | ErrorCode::InvalidMovement | ErrorCode::ReasonRequired => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::AlreadyOpen {
                register_id,
                expired,
            } => ApiError::new(ErrorCode::AlreadyOpen, message)
                .with_details(json!({ "register_id": register_id, "expired": expired })),
            CoreError::NotOpen {
                register_id,
                expired,
            } => {
                let error = ApiError::new(ErrorCode::NotOpen, message);
                if register_id.is_empty() {
                    error
                } else {
                    error.with_details(json!({ "register_id": register_id, "expired": expired }))
                }
            }
            CoreError::InvalidAmount(_) => ApiError::new(ErrorCode::InvalidAmount, message),
            CoreError::InvalidMovement(_) => ApiError::new(ErrorCode::InvalidMovement, message),
            CoreError::ReasonRequired {
                expected,
                counted,
                difference,
            } => ApiError::new(ErrorCode::ReasonRequired, message).with_details(json!({
                "expected_cash_cents": expected.cents(),
                "counted_cash_cents": counted.cents(),
                "difference_cents": difference.cents(),
            })),
            CoreError::RegisterNotFound(id) => ApiError::not_found("Cash register", &id),
            CoreError::Validation(_) => ApiError::validation(message),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                tracing::error!(field = %field, value = %value, "Unexpected unique violation");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConcurrentModification(e) => {
                tracing::warn!("Concurrent modification: {}", e);
                ApiError::new(
                    ErrorCode::Transient,
                    "The register changed while the request was processed; please retry",
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::Transient, "Database is busy; please retry")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use octo_core::Money;

    #[test]
    fn test_core_error_codes() {
        let cases = [
            (
                CoreError::AlreadyOpen {
                    register_id: "r1".into(),
                    expired: false,
                },
                ErrorCode::AlreadyOpen,
                StatusCode::CONFLICT,
            ),
            (CoreError::not_open("r1"), ErrorCode::NotOpen, StatusCode::CONFLICT),
            (
                CoreError::InvalidAmount(ValidationError::MustNotBeNegative {
                    field: "opening_amount".into(),
                }),
                ErrorCode::InvalidAmount,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CoreError::RegisterNotFound("r9".into()),
                ErrorCode::NotFound,
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, code, status) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.code, code);
            assert_eq!(api.status(), status);
        }
    }

    #[test]
    fn test_reason_required_details() {
        let api: ApiError = CoreError::ReasonRequired {
            expected: Money::from_cents(30_000),
            counted: Money::from_cents(25_000),
            difference: Money::from_cents(-5_000),
        }
        .into();

        assert_eq!(api.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let details = api.details.unwrap();
        assert_eq!(details["difference_cents"], -5_000);
        assert_eq!(details["expected_cash_cents"], 30_000);
    }

    #[test]
    fn test_storage_detail_is_hidden() {
        let api: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert!(!api.message.contains("secret"));
    }

    #[test]
    fn test_transient_errors() {
        let api: ApiError = DbError::ConcurrentModification("ledger moved".into()).into();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
        let api: ApiError = DbError::PoolExhausted.into();
        assert_eq!(api.code, ErrorCode::Transient);
    }

    #[test]
    fn test_serialization() {
        let api = ApiError::not_found("Cash register", "r1");
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
