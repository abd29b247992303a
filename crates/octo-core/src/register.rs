//! # Cash Register State Machine
//!
//! Lifecycle rules of a register. Everything here is pure: the caller passes
//! the current time and the [`RegisterPolicy`], and storage is somebody
//! else's job (octo-db applies the same rules atomically in SQLite).
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   NONE ──── open(opening ≥ 0) ────► OPEN ─── now − opened_at > 24h ──┐  │
//! │    ▲                                 │                               │  │
//! │    │                                 │ close(counted, reason?)       ▼  │
//! │    │                                 │                          EXPIRED │
//! │    │                                 ▼                      (derived,   │
//! │    └──────── next open ──────────  CLOSED ◄──── close ────── advisory)  │
//! │                                  (terminal)                             │
//! │                                                                         │
//! │  Stored status is only OPEN | CLOSED. EXPIRED is computed on read.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Closing
//! ```text
//!  expected = summarize(movements, opening).expected_cash
//!  difference = counted − expected
//!  |difference| ≤ tolerance  → close, reason optional
//!  |difference| > tolerance  → reason required, else ReasonRequired
//! ```
//! A failed close leaves the register untouched: [`CashRegister::prepare_close`]
//! computes everything from `&self` and only [`CashRegister::apply_close`]
//! mutates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::NewMovement;
use crate::money::Money;
use crate::reconcile::{summarize, tally, CashSummary};
use crate::types::{CashRegister, Movement, RegisterListing, RegisterStatus};
use crate::validation::{
    normalize_difference_reason, validate_counted_cash, validate_opening_amount,
};
use crate::{DEFAULT_DIFFERENCE_TOLERANCE_CENTS, DEFAULT_EXPIRY_HOURS};

// =============================================================================
// Policy
// =============================================================================

/// Tunables of the register lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterPolicy {
    /// Largest `|counted − expected|` accepted without a reason.
    pub difference_tolerance: Money,
    /// How long a register may stay open before it is reported as expired.
    pub expiry: Duration,
    /// Reject new movements on expired registers.
    pub block_expired_movements: bool,
}

impl Default for RegisterPolicy {
    fn default() -> Self {
        RegisterPolicy {
            difference_tolerance: Money::from_cents(DEFAULT_DIFFERENCE_TOLERANCE_CENTS),
            expiry: Duration::hours(DEFAULT_EXPIRY_HOURS),
            block_expired_movements: false,
        }
    }
}

/// Lifecycle phase as the UI sees it, including the derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterPhase {
    None,
    Open,
    Expired,
    Closed,
}

impl RegisterPhase {
    pub fn of(register: Option<&CashRegister>, now: DateTime<Utc>, policy: &RegisterPolicy) -> Self {
        match register {
            None => RegisterPhase::None,
            Some(r) if r.status == RegisterStatus::Closed => RegisterPhase::Closed,
            Some(r) if r.is_expired_at(now, policy) => RegisterPhase::Expired,
            Some(_) => RegisterPhase::Open,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Operator request to open the business's register.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenRequest {
    #[serde(default)]
    pub opening_amount_cents: i64,
}

/// Operator request to close a register.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseRequest {
    pub counted_cash_cents: i64,
    #[serde(default)]
    pub difference_reason: Option<String>,
}

/// Outcome of a successful close check, ready to be applied or persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closing {
    pub register_id: String,
    pub counted_cash: Money,
    pub expected_cash: Money,
    pub difference: Money,
    pub difference_reason: Option<String>,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
    /// Number of movements the reconciliation was computed over.
    pub movement_count: usize,
}

// =============================================================================
// Transitions
// =============================================================================

impl CashRegister {
    /// NONE → OPEN.
    ///
    /// The one-open-register-per-business check needs the directory and is
    /// done by the caller; this only validates the register's own fields.
    pub fn open(
        business_id: &str,
        opening_amount: Money,
        opened_by: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        validate_opening_amount(opening_amount.cents()).map_err(CoreError::InvalidAmount)?;

        Ok(CashRegister {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            status: RegisterStatus::Open,
            opening_amount_cents: opening_amount.cents(),
            opened_by: opened_by.to_string(),
            opened_at: now,
            closed_by: None,
            closed_at: None,
            counted_cash_cents: None,
            difference_cents: None,
            difference_reason: None,
            created_at: now,
            movements: Vec::new(),
        })
    }

    /// Open for longer than the policy's expiry window.
    ///
    /// A closed register is never expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, policy: &RegisterPolicy) -> bool {
        self.is_open() && now - self.opened_at > policy.expiry
    }

    /// Fails unless a movement may be appended right now.
    pub fn ensure_accepts_movements(
        &self,
        now: DateTime<Utc>,
        policy: &RegisterPolicy,
    ) -> CoreResult<()> {
        match self.status {
            RegisterStatus::Closed => Err(CoreError::not_open(&self.id)),
            RegisterStatus::Open
                if policy.block_expired_movements && self.is_expired_at(now, policy) =>
            {
                Err(CoreError::NotOpen {
                    register_id: self.id.clone(),
                    expired: true,
                })
            }
            RegisterStatus::Open => Ok(()),
        }
    }

    /// Appends a movement to the in-memory ledger.
    ///
    /// The movement gets the next sequence number. Fails with
    /// `InvalidMovement` if it would push a ledger total out of range.
    pub fn record(
        &mut self,
        draft: NewMovement,
        created_by: &str,
        now: DateTime<Utc>,
        policy: &RegisterPolicy,
    ) -> CoreResult<&Movement> {
        let draft = draft.validated()?;
        self.ensure_accepts_movements(now, policy)?;

        let sequence = self.movements.len() as i64 + 1;
        let movement = draft.into_movement(&self.id, sequence, created_by, now);
        tally(self.movements.iter().chain([&movement]), self.opening_amount())?;
        self.movements.push(movement);
        Ok(&self.movements[self.movements.len() - 1])
    }

    /// Summary of the loaded movements.
    pub fn summary(&self) -> CoreResult<CashSummary> {
        summarize(&self.movements, self.opening_amount())
    }

    /// Checks a close without mutating anything.
    ///
    /// ## Errors
    /// - `NotOpen` if already closed (expired registers can be closed)
    /// - `InvalidAmount` if counted cash is negative or above
    ///   `MAX_AMOUNT_CENTS`, or the difference overflows
    /// - `InvalidMovement` if the ledger totals overflow
    /// - `Validation` if the reason is too long
    /// - `ReasonRequired` if the difference exceeds tolerance and no reason
    ///   was given
    pub fn prepare_close(
        &self,
        request: &CloseRequest,
        closed_by: &str,
        now: DateTime<Utc>,
        policy: &RegisterPolicy,
    ) -> CoreResult<Closing> {
        if !self.is_open() {
            return Err(CoreError::not_open(&self.id));
        }

        validate_counted_cash(request.counted_cash_cents).map_err(CoreError::InvalidAmount)?;
        let difference_reason = normalize_difference_reason(request.difference_reason.as_deref())?;

        let counted_cash = Money::from_cents(request.counted_cash_cents);
        let expected_cash = self.summary()?.expected_cash();
        let difference = counted_cash.checked_sub(expected_cash).ok_or_else(|| {
            CoreError::InvalidAmount(ValidationError::Overflow {
                field: "difference".to_string(),
            })
        })?;

        if !difference.within(policy.difference_tolerance) && difference_reason.is_none() {
            return Err(CoreError::ReasonRequired {
                expected: expected_cash,
                counted: counted_cash,
                difference,
            });
        }

        Ok(Closing {
            register_id: self.id.clone(),
            counted_cash,
            expected_cash,
            difference,
            difference_reason,
            closed_by: closed_by.to_string(),
            closed_at: now,
            movement_count: self.movements.len(),
        })
    }

    /// OPEN → CLOSED with an already checked [`Closing`].
    pub fn apply_close(&mut self, closing: Closing) {
        self.status = RegisterStatus::Closed;
        self.closed_at = Some(closing.closed_at);
        self.closed_by = Some(closing.closed_by);
        self.counted_cash_cents = Some(closing.counted_cash.cents());
        self.difference_cents = Some(closing.difference.cents());
        self.difference_reason = closing.difference_reason;
    }

    /// `prepare_close` then `apply_close`.
    pub fn close(
        &mut self,
        request: &CloseRequest,
        closed_by: &str,
        now: DateTime<Utc>,
        policy: &RegisterPolicy,
    ) -> CoreResult<Money> {
        let closing = self.prepare_close(request, closed_by, now, policy)?;
        let difference = closing.difference;
        self.apply_close(closing);
        Ok(difference)
    }

    /// History/listing view of this register.
    pub fn to_listing(&self, now: DateTime<Utc>, policy: &RegisterPolicy) -> RegisterListing {
        RegisterListing {
            id: self.id.clone(),
            status: self.status,
            is_expired: self.is_expired_at(now, policy),
            opening_amount_cents: self.opening_amount_cents,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            counted_cash_cents: self.counted_cash_cents,
            difference_cents: self.difference_cents,
        }
    }
}

// =============================================================================
// Current Register View
// =============================================================================

/// The open register as returned to the UI, with the derived expiry flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterView {
    #[serde(flatten)]
    pub register: CashRegister,
    pub is_expired: bool,
}

impl RegisterView {
    pub fn new(register: CashRegister, now: DateTime<Utc>, policy: &RegisterPolicy) -> Self {
        let is_expired = register.is_expired_at(now, policy);
        RegisterView {
            register,
            is_expired,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
