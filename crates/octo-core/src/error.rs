//! # Error Types
//!
//! Domain-specific error types for octo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  octo-core errors (this file)                                          │
//! │  ├── CoreError        - Register lifecycle / ledger rule violations    │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  octo-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What the operator UI sees (code + message)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is raised before any state is mutated, so the caller
//! never has to undo anything after a failure.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Cash register business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The business already has an OPEN register.
    ///
    /// ## When This Occurs
    /// - Operator presses "open register" twice
    /// - Two terminals race to open the day's register
    /// - Yesterday's register was never closed (then `expired` is true and
    ///   the UI should push the operator to close it first)
    #[error("{}", already_open_message(.register_id, .expired))]
    AlreadyOpen { register_id: String, expired: bool },

    /// The register does not accept the operation because it is not open.
    ///
    /// ## When This Occurs
    /// - Appending to or closing a CLOSED register
    /// - A voucher event arrives while the business has no open register
    /// - Appending to an expired register when the policy blocks it
    ///   (`expired` is true)
    #[error("{}", not_open_message(.register_id, .expired))]
    NotOpen { register_id: String, expired: bool },

    /// A monetary input of the register itself is invalid
    /// (negative or oversized opening amount or counted cash).
    #[error("Invalid amount: {0}")]
    InvalidAmount(ValidationError),

    /// A movement failed ledger validation.
    #[error("Invalid movement: {0}")]
    InvalidMovement(ValidationError),

    /// Counted cash differs from expected cash beyond tolerance and no
    /// reason was given.
    ///
    /// ## User Workflow
    /// ```text
    /// Close register: counted $250.00
    ///      │
    ///      ▼
    /// expected $300.00 → difference -$50.00 > tolerance
    ///      │
    ///      ▼
    /// ReasonRequired ─► UI asks "why is the drawer short?"
    ///      │
    ///      ▼
    /// Close again with reason "faltante" ─► CLOSED
    /// ```
    #[error("A difference reason is required: counted {counted}, expected {expected} (difference {difference})")]
    ReasonRequired {
        expected: Money,
        counted: Money,
        difference: Money,
    },

    /// No register with this id exists for the business.
    #[error("Cash register not found: {0}")]
    RegisterNotFound(String),

    /// Validation error outside the movement/amount categories.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn already_open_message(register_id: &str, expired: &bool) -> String {
    if *expired {
        format!(
            "Register {} has been open for more than the allowed period; close it before opening a new one",
            register_id
        )
    } else {
        format!(
            "Register {} is already open; close it before opening a new one",
            register_id
        )
    }
}

fn not_open_message(register_id: &str, expired: &bool) -> String {
    if register_id.is_empty() {
        "There is no open register for this business".to_string()
    } else if *expired {
        format!(
            "Register {} is expired; close it before recording new movements",
            register_id
        )
    } else {
        format!("Register {} is not open", register_id)
    }
}

impl CoreError {
    /// Creates a NotOpen error for a register that is closed (or missing
    /// from the caller's point of view, e.g. no open register exists).
    pub fn not_open(register_id: impl Into<String>) -> Self {
        CoreError::NotOpen {
            register_id: register_id.into(),
            expired: false,
        }
    }

    /// Creates a NotOpen error for a business that has no open register.
    pub fn no_open_register() -> Self {
        CoreError::not_open(String::new())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A computed total does not fit in the money representation.
    #[error("{field} exceeds the supported range")]
    Overflow { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_open_messages() {
        let err = CoreError::AlreadyOpen {
            register_id: "reg-1".to_string(),
            expired: false,
        };
        assert_eq!(
            err.to_string(),
            "Register reg-1 is already open; close it before opening a new one"
        );

        let err = CoreError::AlreadyOpen {
            register_id: "reg-1".to_string(),
            expired: true,
        };
        assert!(err.to_string().contains("more than the allowed period"));
    }

    #[test]
    fn test_not_open_messages() {
        assert_eq!(
            CoreError::not_open("reg-9").to_string(),
            "Register reg-9 is not open"
        );

        let err = CoreError::NotOpen {
            register_id: "reg-9".to_string(),
            expired: true,
        };
        assert!(err.to_string().contains("is expired"));

        assert_eq!(
            CoreError::no_open_register().to_string(),
            "There is no open register for this business"
        );
    }

    #[test]
    fn test_reason_required_message() {
        let err = CoreError::ReasonRequired {
            expected: Money::from_cents(30000),
            counted: Money::from_cents(25000),
            difference: Money::from_cents(-5000),
        };
        assert_eq!(
            err.to_string(),
            "A difference reason is required: counted $250.00, expected $300.00 (difference -$50.00)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "description".to_string(),
        };
        assert_eq!(err.to_string(), "description is required");

        let err = ValidationError::MustNotBeNegative {
            field: "opening_amount".to_string(),
        };
        assert_eq!(err.to_string(), "opening_amount must not be negative");

        let err = ValidationError::Overflow {
            field: "ledger_total".to_string(),
        };
        assert_eq!(err.to_string(), "ledger_total exceeds the supported range");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
