//! # Validation Module
//!
//! Input validation for register and movement operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator UI (TypeScript)                                     │
//! │  └── Immediate feedback (empty description, negative amount)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (serde)                                         │
//! │  └── Type validation (unknown enum values, malformed JSON)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: octo-core (THIS MODULE)                                      │
//! │  └── Business rules, before any state is touched                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: SQLite                                                       │
//! │  └── CHECK (amount_cents > 0), partial UNIQUE on open registers        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use octo_core::validation::{validate_movement_amount, validate_opening_amount};
//!
//! assert!(validate_opening_amount(0).is_ok());
//! assert!(validate_movement_amount(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT_CENTS, MAX_DESCRIPTION_LEN, MAX_HISTORY_LIMIT, MAX_REASON_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates the cash placed in the drawer when opening.
///
/// Zero is allowed (a register can start empty). At most
/// `MAX_AMOUNT_CENTS`.
pub fn validate_opening_amount(cents: i64) -> ValidationResult<()> {
    drawer_amount("opening_amount", cents)
}

/// Validates the cash physically counted at close.
pub fn validate_counted_cash(cents: i64) -> ValidationResult<()> {
    drawer_amount("counted_cash", cents)
}

/// Validates a movement amount. Must be strictly positive; the direction
/// of the movement comes from its type.
///
/// ## Example
/// ```rust
/// use octo_core::validation::validate_movement_amount;
///
/// assert!(validate_movement_amount(1).is_ok());
/// assert!(validate_movement_amount(0).is_err());
/// assert!(validate_movement_amount(-500).is_err());
/// assert!(validate_movement_amount(i64::MAX).is_err());
/// ```
pub fn validate_movement_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    at_most_max("amount", 1, cents)
}

fn drawer_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    at_most_max(field, 0, cents)
}

fn at_most_max(field: &str, min: i64, cents: i64) -> ValidationResult<()> {
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates and normalizes a movement description.
///
/// ## Rules
/// - Trimmed before checking
/// - Required (non-blank) when `required` is true (manual movements)
/// - At most `MAX_DESCRIPTION_LEN` characters
///
/// Returns the trimmed description.
pub fn validate_description(description: &str, required: bool) -> ValidationResult<String> {
    let trimmed = description.trim();

    if required && trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(trimmed.to_string())
}

/// Normalizes a close difference reason.
///
/// Blank input is treated as "no reason". Returns the trimmed reason.
pub fn normalize_difference_reason(reason: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    if reason.chars().count() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "difference_reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(Some(reason.to_string()))
}

/// Validates an operator or business identifier supplied by the caller.
pub fn validate_actor_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }
    Ok(())
}

// =============================================================================
// Identifier / Query Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;
    Ok(())
}

/// Clamps a history page size into `1..=MAX_HISTORY_LIMIT`.
///
/// Out-of-range values are clamped rather than rejected: the limit is a
/// display preference, not a business rule.
pub fn clamp_history_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_HISTORY_LIMIT)
}

// =============================================================================
// Unit Tests
// =============================================================================
