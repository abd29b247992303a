//! # Movement Ledger
//!
//! Drafts of movements and the rules a movement must satisfy before it is
//! appended to a register's ledger.
//!
//! ## Two Sources, One Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Operator UI                         Voucher subsystem                  │
//! │  "add income / expense"              voucher confirmed / collected      │
//! │        │                                     │                          │
//! │        ▼                                     ▼                          │
//! │  NewMovement::manual(..)            NewMovement::from_voucher(..)      │
//! │  INCOME | EXPENSE only              SALE | PAYMENT_RECEIVED only       │
//! │  description required               voucher_id allowed                 │
//! │        │                                     │                          │
//! │        └──────────────┬──────────────────────┘                          │
//! │                       ▼                                                 │
//! │              NewMovement::validated()                                   │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │       append (in memory: CashRegister::record,                          │
//! │               in SQLite: MovementRepository::append)                    │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │              Movement { sequence: n + 1 }   never updated or deleted   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Corrections are recorded as offsetting movements; there is no update or
//! delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Movement, MovementType, PaymentMethod};
use crate::validation::{validate_description, validate_movement_amount};

/// Where a movement draft came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOrigin {
    /// Entered by the operator.
    Manual,
    /// Produced by the voucher subsystem.
    Voucher,
}

/// A movement that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub origin: MovementOrigin,
    pub movement_type: MovementType,
    pub payment_method: PaymentMethod,
    pub amount: Money,
    pub description: String,
    pub voucher_id: Option<String>,
}

impl NewMovement {
    /// Draft of an operator-entered INCOME or EXPENSE.
    pub fn manual(
        movement_type: MovementType,
        payment_method: PaymentMethod,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        NewMovement {
            origin: MovementOrigin::Manual,
            movement_type,
            payment_method,
            amount,
            description: description.into(),
            voucher_id: None,
        }
    }

    /// Draft of a SALE or PAYMENT_RECEIVED generated by a voucher event.
    pub fn from_voucher(event: &VoucherEvent) -> Self {
        NewMovement {
            origin: MovementOrigin::Voucher,
            movement_type: event.movement_type,
            payment_method: event.payment_method,
            amount: Money::from_cents(event.amount_cents),
            description: event.description.clone(),
            voucher_id: event.voucher_id.clone(),
        }
    }

    /// Checks the draft against the ledger rules and returns it normalized
    /// (description trimmed, blank voucher id dropped).
    ///
    /// ## Errors
    /// `CoreError::InvalidMovement` when:
    /// - the amount is zero or negative
    /// - a manual draft has a non-manual type (or a voucher draft a manual one)
    /// - a manual draft has a blank description or carries a voucher id
    /// - the description exceeds the maximum length
    pub fn validated(self) -> CoreResult<Self> {
        validate_movement_amount(self.amount.cents()).map_err(CoreError::InvalidMovement)?;

        let manual = self.origin == MovementOrigin::Manual;
        if manual != self.movement_type.is_manual() {
            let allowed = if manual {
                MovementType::MANUAL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect()
            } else {
                vec![
                    MovementType::Sale.as_str().to_string(),
                    MovementType::PaymentReceived.as_str().to_string(),
                ]
            };
            return Err(CoreError::InvalidMovement(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed,
            }));
        }

        let description =
            validate_description(&self.description, manual).map_err(CoreError::InvalidMovement)?;

        let voucher_id = self
            .voucher_id
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if manual && voucher_id.is_some() {
            return Err(CoreError::InvalidMovement(ValidationError::InvalidFormat {
                field: "voucher_id".to_string(),
                reason: "manual movements cannot reference a voucher".to_string(),
            }));
        }

        Ok(NewMovement {
            description,
            voucher_id,
            ..self
        })
    }

    /// Materializes the draft at ledger position `sequence`.
    ///
    /// Callers validate first; this only assigns identity and audit fields.
    pub fn into_movement(
        self,
        cash_register_id: &str,
        sequence: i64,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Movement {
        Movement {
            id: Uuid::new_v4().to_string(),
            cash_register_id: cash_register_id.to_string(),
            sequence,
            movement_type: self.movement_type,
            payment_method: self.payment_method,
            amount_cents: self.amount.cents(),
            description: self.description,
            voucher_id: self.voucher_id,
            created_by: created_by.to_string(),
            created_at: now,
        }
    }
}

// =============================================================================
// Inbound Payloads
// =============================================================================

/// Operator request to record a manual movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualMovementRequest {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    pub description: String,
}

impl ManualMovementRequest {
    pub fn into_draft(self) -> NewMovement {
        NewMovement::manual(
            self.movement_type,
            self.payment_method,
            Money::from_cents(self.amount_cents),
            self.description,
        )
    }
}

/// A SALE / PAYMENT_RECEIVED event posted by the voucher subsystem.
///
/// The voucher itself is not inspected; only the movement it implies must
/// be well formed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoucherEvent {
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub voucher_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn income(cents: i64, description: &str) -> NewMovement {
        NewMovement::manual(
            MovementType::Income,
            PaymentMethod::Cash,
            Money::from_cents(cents),
            description,
        )
    }

    fn sale_event(cents: i64) -> VoucherEvent {
        VoucherEvent {
            movement_type: MovementType::Sale,
            payment_method: PaymentMethod::Cash,
            amount_cents: cents,
            description: "Factura B 0001-00000042".to_string(),
            voucher_id: Some("v-42".to_string()),
        }
    }

    #[test]
    fn test_manual_movement_is_normalized() {
        let draft = income(50_000, "  caja chica ").validated().unwrap();
        assert_eq!(draft.description, "caja chica");
        assert_eq!(draft.voucher_id, None);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        for cents in [0, -1, -50_000] {
            let err = income(cents, "caja chica").validated().unwrap_err();
            assert!(matches!(
                err,
                CoreError::InvalidMovement(ValidationError::MustBePositive { .. })
            ));
        }

        let err = NewMovement::from_voucher(&sale_event(0))
            .validated()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidMovement(_)));
    }

    #[test]
    fn test_manual_requires_description() {
        let err = income(100, "   ").validated().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidMovement(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_manual_rejects_system_types() {
        let draft = NewMovement::manual(
            MovementType::Sale,
            PaymentMethod::Cash,
            Money::from_cents(100),
            "not allowed",
        );
        let err = draft.validated().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidMovement(ValidationError::NotAllowed { ref field, .. }) if field == "type"
        ));
    }

    #[test]
    fn test_manual_rejects_voucher_id() {
        let mut draft = income(100, "caja chica");
        draft.voucher_id = Some("v-1".to_string());
        assert!(matches!(
            draft.validated(),
            Err(CoreError::InvalidMovement(ValidationError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn test_voucher_movement() {
        let draft = NewMovement::from_voucher(&sale_event(30_000))
            .validated()
            .unwrap();
        assert_eq!(draft.origin, MovementOrigin::Voucher);
        assert_eq!(draft.voucher_id.as_deref(), Some("v-42"));

        let mut event = sale_event(100);
        event.movement_type = MovementType::Expense;
        assert!(NewMovement::from_voucher(&event).validated().is_err());

        // Voucher movements may have an empty description
        let mut event = sale_event(100);
        event.description = String::new();
        event.voucher_id = Some("  ".to_string());
        let draft = NewMovement::from_voucher(&event).validated().unwrap();
        assert_eq!(draft.voucher_id, None);
    }

    #[test]
    fn test_into_movement() {
        let now = Utc::now();
        let movement = income(500, "caja chica")
            .validated()
            .unwrap()
            .into_movement("reg-1", 3, "op-1", now);

        assert_eq!(movement.cash_register_id, "reg-1");
        assert_eq!(movement.sequence, 3);
        assert_eq!(movement.amount_cents, 500);
        assert_eq!(movement.created_by, "op-1");
        assert_eq!(movement.created_at, now);
        assert!(Uuid::parse_str(&movement.id).is_ok());
    }

    #[test]
    fn test_request_deserializes_wire_names() {
        let request: ManualMovementRequest = serde_json::from_str(
            r#"{"type":"EXPENSE","payment_method":"CASH","amount_cents":1500,"description":"cafe"}"#,
        )
        .unwrap();
        let draft = request.into_draft();
        assert_eq!(draft.movement_type, MovementType::Expense);
        assert_eq!(draft.amount.cents(), 1500);
        assert_eq!(draft.origin, MovementOrigin::Manual);
    }
}
