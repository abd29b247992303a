//! # octo-core: Pure Cash Register Logic for OctopusTrack
//!
//! This crate is the **heart** of the OctopusTrack cash register. It holds
//! the register lifecycle, the ledger rules and the reconciliation
//! arithmetic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    OctopusTrack Cash Architecture                       │
//! │                                                                         │
//! │  ┌────────────────────────────┐   ┌────────────────────────────────┐   │
//! │  │      Operator UI (React)   │   │   Voucher subsystem            │   │
//! │  │  open / close / movements  │   │   SALE / PAYMENT_RECEIVED      │   │
//! │  └─────────────┬──────────────┘   └───────────────┬────────────────┘   │
//! │                │ HTTP (apps/api)                  │                     │
//! │  ┌─────────────▼──────────────────────────────────▼────────────────┐   │
//! │  │                 octo-db (SQLite repositories)                   │   │
//! │  │       atomic open / append / close, register history            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ octo-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────────┐         │   │
//! │  │   │ register │ │  ledger  │ │reconcile │ │ validation│         │   │
//! │  │   │  states  │ │  drafts  │ │ summary  │ │   rules   │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └───────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CashRegister, Movement, enums)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//! - [`ledger`] - Movement drafts and append rules
//! - [`register`] - Lifecycle state machine and close checks
//! - [`reconcile`] - Per-method summaries, expected cash, closure report
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use octo_core::{CashRegister, CloseRequest, Money, MovementType, NewMovement,
//!                 PaymentMethod, RegisterPolicy};
//!
//! let policy = RegisterPolicy::default();
//! let now = Utc::now();
//!
//! let mut register = CashRegister::open("biz1", Money::from_cents(100_000), "ana", now).unwrap();
//! let income = NewMovement::manual(
//!     MovementType::Income,
//!     PaymentMethod::Cash,
//!     Money::from_cents(50_000),
//!     "caja chica",
//! );
//! register.record(income, "ana", now, &policy).unwrap();
//! assert_eq!(register.summary().unwrap().expected_cash_cents, 150_000);
//!
//! let request = CloseRequest { counted_cash_cents: 150_000, difference_reason: None };
//! let difference = register.close(&request, "ana", now, &policy).unwrap();
//! assert!(difference.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod reconcile;
pub mod register;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{ManualMovementRequest, MovementOrigin, NewMovement, VoucherEvent};
pub use money::Money;
pub use reconcile::{summarize, CashSummary, ClosureReport, PaymentMethodSummary};
pub use register::{
    CloseRequest, Closing, OpenRequest, RegisterPhase, RegisterPolicy, RegisterView,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Hours an open register may run before it is reported as expired.
pub const DEFAULT_EXPIRY_HOURS: i64 = 24;

/// Default close tolerance, in cents (the historical 0.01).
pub const DEFAULT_DIFFERENCE_TOLERANCE_CENTS: i64 = 1;

/// Default page size of the register history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 30;

/// Upper bound of the register history page size.
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Largest single amount accepted anywhere (opening, movement, counted
/// cash): $10,000,000,000.00. Keeps ledger totals far from `i64` limits.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Maximum movement description length (characters).
pub const MAX_DESCRIPTION_LEN: usize = 255;

/// Maximum close difference reason length (characters).
pub const MAX_REASON_LEN: usize = 500;
