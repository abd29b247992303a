//! # Domain Types
//!
//! Core domain types used throughout the OctopusTrack cash register.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐  1     *  ┌─────────────────────┐             │
//! │  │    CashRegister     │──────────►│      Movement       │             │
//! │  │  ─────────────────  │           │  ─────────────────  │             │
//! │  │  id (UUID)          │           │  id (UUID)          │             │
//! │  │  business_id        │           │  cash_register_id   │             │
//! │  │  status             │           │  sequence           │             │
//! │  │  opening_amount     │           │  movement_type      │             │
//! │  │  counted_cash       │           │  payment_method     │             │
//! │  │  difference         │           │  amount_cents (>0)  │             │
//! │  └─────────────────────┘           └─────────────────────┘             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ RegisterStatus  │   │  MovementType   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Open           │   │  Sale           │   │  Cash           │       │
//! │  │  Closed         │   │  PaymentReceived│   │  Card           │       │
//! │  └─────────────────┘   │  Income         │   │  Transfer       │       │
//! │                        │  Expense        │   │  Check          │       │
//! │                        └─────────────────┘   │  Other          │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire vs Storage Names
//! Enums serialize as `SCREAMING_SNAKE_CASE` on the wire (`"PAYMENT_RECEIVED"`)
//! and are stored as lowercase snake_case TEXT in SQLite (`payment_received`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle state of a cash register.
///
/// `Expired` is deliberately not a status: it is derived from `opened_at`
/// and the current time (see `CashRegister::is_expired_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterStatus {
    Open,
    Closed,
}

impl RegisterStatus {
    /// Storage representation, as written in the `status` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RegisterStatus::Open => "open",
            RegisterStatus::Closed => "closed",
        }
    }
}

/// Kind of a movement.
///
/// ```text
///  Sale, PaymentReceived  → created by voucher events (automatic)
///  Income, Expense        → created by the operator (manual)
///  Expense                → the only outflow; all others add to the drawer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Sale,
    PaymentReceived,
    Income,
    Expense,
}

impl MovementType {
    /// Types an operator may record by hand.
    pub const MANUAL: [MovementType; 2] = [MovementType::Income, MovementType::Expense];

    /// Whether this type may be recorded manually by the operator.
    pub const fn is_manual(&self) -> bool {
        matches!(self, MovementType::Income | MovementType::Expense)
    }

    /// Whether this movement takes money out of the register.
    pub const fn is_outflow(&self) -> bool {
        matches!(self, MovementType::Expense)
    }

    /// Wire name, as the UI sees it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "SALE",
            MovementType::PaymentReceived => "PAYMENT_RECEIVED",
            MovementType::Income => "INCOME",
            MovementType::Expense => "EXPENSE",
        }
    }
}

/// How money was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
    Other,
}

impl PaymentMethod {
    /// Every method, in the fixed order used by summaries and reports.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Check,
        PaymentMethod::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Other => "OTHER",
        }
    }
}

// =============================================================================
// Cash Register
// =============================================================================

/// One working session of a business's cash drawer.
///
/// At most one register per business is `Open` at any time. Once `Closed`,
/// every field is frozen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashRegister {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business (tenant) the register belongs to.
    pub business_id: String,

    pub status: RegisterStatus,

    /// Cash in the drawer when the register was opened, in cents.
    pub opening_amount_cents: i64,

    /// Operator who opened the register.
    pub opened_by: String,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    /// Operator who closed the register.
    pub closed_by: Option<String>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    /// Cash physically counted at close, in cents.
    pub counted_cash_cents: Option<i64>,

    /// `counted - expected` at close. Negative means shortage.
    pub difference_cents: Option<i64>,

    /// Operator's justification when the difference exceeded tolerance.
    pub difference_reason: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Movements in ledger order. Loaded separately by the repository.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub movements: Vec<Movement>,
}

impl CashRegister {
    #[inline]
    pub fn opening_amount(&self) -> Money {
        Money::from_cents(self.opening_amount_cents)
    }

    #[inline]
    pub fn counted_cash(&self) -> Option<Money> {
        self.counted_cash_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn difference(&self) -> Option<Money> {
        self.difference_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Movement
// =============================================================================

/// A single immutable ledger entry of a register.
///
/// `sequence` is the 1-based position in the register's ledger; it is the
/// total order used for listing and reconciliation, independent of clock
/// resolution on `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    pub id: String,
    pub cash_register_id: String,
    pub sequence: i64,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub payment_method: PaymentMethod,
    /// Always strictly positive; direction comes from `movement_type`.
    pub amount_cents: i64,
    pub description: String,
    /// Voucher that produced this movement (automatic movements only).
    pub voucher_id: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Movement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Amount with the sign it contributes to the register's balance.
    #[inline]
    pub fn signed_amount(&self) -> Money {
        if self.movement_type.is_outflow() {
            -self.amount()
        } else {
            self.amount()
        }
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Compact register view used by the history list and the "current
/// register" banner of the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterListing {
    pub id: String,
    pub status: RegisterStatus,
    /// Open for longer than the configured expiry window.
    pub is_expired: bool,
    pub opening_amount_cents: i64,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub counted_cash_cents: Option<i64>,
    pub difference_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
