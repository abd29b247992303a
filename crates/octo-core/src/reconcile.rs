//! # Reconciliation Engine
//!
//! Pure aggregation of a register's movements into per-payment-method
//! totals, plus the expected cash figure used at close.
//!
//! ## Expected Cash
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   net(method) = sales + payments_received + income − expense            │
//! │                                                                         │
//! │   CASH     ──► net ──┐                                                  │
//! │   CARD     ──► net   │   settled outside the drawer,                    │
//! │   TRANSFER ──► net   │   reported for information only                  │
//! │   CHECK    ──► net   │                                                  │
//! │   OTHER    ──► net   │                                                  │
//! │                      ▼                                                  │
//! │   expected_cash = net(CASH) + opening_amount                            │
//! │   difference    = counted_cash − expected_cash                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Summaries are never persisted. The same movements and opening amount
//! always produce the same summary, whatever order the movements come in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashRegister, Movement, MovementType, PaymentMethod};

// =============================================================================
// Per-Method Summary
// =============================================================================

/// Totals of one payment method, by movement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMethodSummary {
    pub payment_method: PaymentMethod,
    pub total_sales_cents: i64,
    pub total_payments_received_cents: i64,
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    pub net_cents: i64,
}

impl PaymentMethodSummary {
    fn empty(payment_method: PaymentMethod) -> Self {
        PaymentMethodSummary {
            payment_method,
            total_sales_cents: 0,
            total_payments_received_cents: 0,
            total_income_cents: 0,
            total_expense_cents: 0,
            net_cents: 0,
        }
    }

    fn add(&mut self, movement: &Movement) -> CoreResult<()> {
        let slot = match movement.movement_type {
            MovementType::Sale => &mut self.total_sales_cents,
            MovementType::PaymentReceived => &mut self.total_payments_received_cents,
            MovementType::Income => &mut self.total_income_cents,
            MovementType::Expense => &mut self.total_expense_cents,
        };
        *slot = slot
            .checked_add(movement.amount_cents)
            .ok_or_else(overflow)?;
        self.net_cents = self
            .net()
            .checked_add(movement.signed_amount())
            .ok_or_else(overflow)?
            .cents();
        Ok(())
    }

    #[inline]
    pub fn net(&self) -> Money {
        Money::from_cents(self.net_cents)
    }
}

// =============================================================================
// Cash Summary
// =============================================================================

/// The register-wide summary shown to the operator before closing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashSummary {
    /// One entry per payment method, always in `PaymentMethod::ALL` order.
    pub by_method: Vec<PaymentMethodSummary>,
    pub total_net_cents: i64,
    pub opening_amount_cents: i64,
    pub expected_cash_cents: i64,
}

impl CashSummary {
    /// Summary for one payment method.
    pub fn method(&self, method: PaymentMethod) -> Option<&PaymentMethodSummary> {
        self.by_method.iter().find(|s| s.payment_method == method)
    }

    #[inline]
    pub fn expected_cash(&self) -> Money {
        Money::from_cents(self.expected_cash_cents)
    }

    #[inline]
    pub fn total_net(&self) -> Money {
        Money::from_cents(self.total_net_cents)
    }
}

/// Aggregates `movements` and computes the expected cash.
///
/// ## Errors
/// `InvalidMovement` if a total does not fit in `i64` cents. Amounts are
/// bounded by `MAX_AMOUNT_CENTS`, so this takes millions of maximal
/// movements on one register.
///
/// ## Example
/// ```rust
/// use octo_core::money::Money;
/// use octo_core::reconcile::summarize;
///
/// let summary = summarize(&[], Money::from_cents(100_000)).unwrap();
/// assert_eq!(summary.expected_cash().cents(), 100_000);
/// assert_eq!(summary.by_method.len(), 5);
/// ```
pub fn summarize(movements: &[Movement], opening_amount: Money) -> CoreResult<CashSummary> {
    tally(movements, opening_amount)
}

/// `summarize` over any sequence of movements, e.g. the ledger plus a
/// movement not recorded yet.
pub(crate) fn tally<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    opening_amount: Money,
) -> CoreResult<CashSummary> {
    let mut by_method: Vec<PaymentMethodSummary> = PaymentMethod::ALL
        .iter()
        .map(|m| PaymentMethodSummary::empty(*m))
        .collect();

    for movement in movements {
        if let Some(entry) = by_method
            .iter_mut()
            .find(|s| s.payment_method == movement.payment_method)
        {
            entry.add(movement)?;
        }
    }

    let total_net = by_method
        .iter()
        .try_fold(Money::zero(), |acc, s| acc.checked_add(s.net()))
        .ok_or_else(overflow)?;
    let mut summary = CashSummary {
        by_method,
        total_net_cents: total_net.cents(),
        opening_amount_cents: opening_amount.cents(),
        expected_cash_cents: 0,
    };
    let cash_net = summary
        .method(PaymentMethod::Cash)
        .map(PaymentMethodSummary::net)
        .unwrap_or_default();
    summary.expected_cash_cents = cash_net
        .checked_add(opening_amount)
        .ok_or_else(overflow)?
        .cents();
    Ok(summary)
}

fn overflow() -> CoreError {
    CoreError::InvalidMovement(ValidationError::Overflow {
        field: "ledger_total".to_string(),
    })
}

// =============================================================================
// Closure Report
// =============================================================================

/// Data behind the closure document rendered by the reporting subsystem.
///
/// Formatting and rendering happen elsewhere; this is numbers only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClosureReport {
    pub register: CashRegister,
    pub summary: CashSummary,
    pub total_sales_cents: i64,
    pub total_payments_received_cents: i64,
    pub total_income_cents: i64,
    pub total_expense_cents: i64,
    pub cash_net_cents: i64,
    pub movement_count: i64,
}

impl ClosureReport {
    /// Builds the report from a register whose movements are loaded.
    pub fn build(register: CashRegister) -> CoreResult<Self> {
        let summary = summarize(&register.movements, register.opening_amount())?;

        let column = |f: fn(&PaymentMethodSummary) -> i64| -> CoreResult<i64> {
            summary
                .by_method
                .iter()
                .map(f)
                .try_fold(0i64, i64::checked_add)
                .ok_or_else(overflow)
        };
        let total_sales_cents = column(|s| s.total_sales_cents)?;
        let total_payments_received_cents = column(|s| s.total_payments_received_cents)?;
        let total_income_cents = column(|s| s.total_income_cents)?;
        let total_expense_cents = column(|s| s.total_expense_cents)?;
        let cash_net_cents = summary
            .method(PaymentMethod::Cash)
            .map(|s| s.net_cents)
            .unwrap_or_default();
        let movement_count = register.movements.len() as i64;

        Ok(ClosureReport {
            register,
            summary,
            total_sales_cents,
            total_payments_received_cents,
            total_income_cents,
            total_expense_cents,
            cash_net_cents,
            movement_count,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::MAX_AMOUNT_CENTS;
    use proptest::prelude::*;

    fn movement(
        sequence: i64,
        movement_type: MovementType,
        payment_method: PaymentMethod,
        amount_cents: i64,
    ) -> Movement {
        Movement {
            id: format!("m-{}", sequence),
            cash_register_id: "r-1".to_string(),
            sequence,
            movement_type,
            payment_method,
            amount_cents,
            description: String::new(),
            voucher_id: None,
            created_by: "op-1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_register() {
        let summary = summarize(&[], Money::zero()).unwrap();
        assert_eq!(summary.by_method.len(), 5);
        assert!(summary.by_method.iter().all(|s| s.net_cents == 0));
        assert_eq!(summary.expected_cash_cents, 0);
        assert_eq!(summary.total_net_cents, 0);
    }

    #[test]
    fn test_method_order_is_fixed() {
        let movements = vec![movement(1, MovementType::Sale, PaymentMethod::Other, 100)];
        let summary = summarize(&movements, Money::zero()).unwrap();
        let order: Vec<PaymentMethod> = summary.by_method.iter().map(|s| s.payment_method).collect();
        assert_eq!(order, PaymentMethod::ALL.to_vec());
    }

    #[test]
    fn test_totals_by_type() {
        let movements = vec![
            movement(1, MovementType::Sale, PaymentMethod::Cash, 30_000),
            movement(2, MovementType::PaymentReceived, PaymentMethod::Cash, 5_000),
            movement(3, MovementType::Income, PaymentMethod::Cash, 2_000),
            movement(4, MovementType::Expense, PaymentMethod::Cash, 1_500),
            movement(5, MovementType::Sale, PaymentMethod::Card, 12_000),
            movement(6, MovementType::Expense, PaymentMethod::Transfer, 4_000),
        ];
        let summary = summarize(&movements, Money::from_cents(10_000)).unwrap();

        let cash = summary.method(PaymentMethod::Cash).unwrap();
        assert_eq!(cash.total_sales_cents, 30_000);
        assert_eq!(cash.total_payments_received_cents, 5_000);
        assert_eq!(cash.total_income_cents, 2_000);
        assert_eq!(cash.total_expense_cents, 1_500);
        assert_eq!(cash.net_cents, 35_500);

        assert_eq!(summary.method(PaymentMethod::Card).unwrap().net_cents, 12_000);
        assert_eq!(summary.method(PaymentMethod::Transfer).unwrap().net_cents, -4_000);
        assert_eq!(summary.method(PaymentMethod::Check).unwrap().net_cents, 0);

        // Only CASH feeds the drawer
        assert_eq!(summary.expected_cash_cents, 45_500);
        assert_eq!(summary.total_net_cents, 35_500 + 12_000 - 4_000);
    }

    #[test]
    fn test_closure_report_totals() {
        let now = Utc::now();
        let register = CashRegister {
            id: "r-1".to_string(),
            business_id: "biz-1".to_string(),
            status: crate::types::RegisterStatus::Open,
            opening_amount_cents: 100_000,
            opened_by: "op-1".to_string(),
            opened_at: now,
            closed_by: None,
            closed_at: None,
            counted_cash_cents: None,
            difference_cents: None,
            difference_reason: None,
            created_at: now,
            movements: vec![
                movement(1, MovementType::Sale, PaymentMethod::Cash, 300),
                movement(2, MovementType::Sale, PaymentMethod::Card, 700),
                movement(3, MovementType::Expense, PaymentMethod::Cash, 100),
            ],
        };

        let report = ClosureReport::build(register).unwrap();
        assert_eq!(report.total_sales_cents, 1_000);
        assert_eq!(report.total_expense_cents, 100);
        assert_eq!(report.total_income_cents, 0);
        assert_eq!(report.cash_net_cents, 200);
        assert_eq!(report.movement_count, 3);
        assert_eq!(report.summary.expected_cash_cents, 100_200);
    }

    #[test]
    fn test_overflowing_totals_are_an_error() {
        let movements = vec![
            movement(1, MovementType::Income, PaymentMethod::Cash, i64::MAX),
            movement(2, MovementType::Income, PaymentMethod::Cash, i64::MAX),
        ];
        assert!(matches!(
            summarize(&movements, Money::zero()),
            Err(CoreError::InvalidMovement(ValidationError::Overflow { .. }))
        ));

        // Each method fits on its own, the register-wide net does not
        let movements = vec![
            movement(1, MovementType::Sale, PaymentMethod::Cash, i64::MAX),
            movement(2, MovementType::Sale, PaymentMethod::Card, 1),
        ];
        assert!(summarize(&movements, Money::zero()).is_err());

        // Cash net plus the opening amount
        let movements = vec![movement(1, MovementType::Sale, PaymentMethod::Cash, i64::MAX)];
        assert!(summarize(&movements, Money::from_cents(1)).is_err());
        assert_eq!(
            summarize(&movements, Money::zero()).unwrap().expected_cash_cents,
            i64::MAX
        );
    }

    #[test]
    fn test_maximal_amounts_sum_exactly() {
        let movements: Vec<Movement> = (1..=1_000)
            .map(|i| movement(i, MovementType::Income, PaymentMethod::Cash, MAX_AMOUNT_CENTS))
            .collect();
        let summary = summarize(&movements, Money::from_cents(MAX_AMOUNT_CENTS)).unwrap();
        assert_eq!(summary.expected_cash_cents, 1_001 * MAX_AMOUNT_CENTS);
    }

    fn arb_movement() -> impl Strategy<Value = Movement> {
        (
            0usize..4,
            0usize..5,
            1i64..10_000_000,
        )
            .prop_map(|(t, m, amount)| {
                let types = [
                    MovementType::Sale,
                    MovementType::PaymentReceived,
                    MovementType::Income,
                    MovementType::Expense,
                ];
                movement(0, types[t], PaymentMethod::ALL[m], amount)
            })
    }

    proptest! {
        #[test]
        fn prop_summary_is_idempotent(
            movements in prop::collection::vec(arb_movement(), 0..64),
            opening in 0i64..100_000_000,
        ) {
            let opening = Money::from_cents(opening);
            let first = summarize(&movements, opening).unwrap();
            let second = summarize(&movements, opening).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_summary_ignores_movement_order(
            movements in prop::collection::vec(arb_movement(), 0..64),
            opening in 0i64..100_000_000,
        ) {
            let opening = Money::from_cents(opening);
            let mut reversed = movements.clone();
            reversed.reverse();
            prop_assert_eq!(
                summarize(&movements, opening).unwrap(),
                summarize(&reversed, opening).unwrap()
            );
        }

        #[test]
        fn prop_expected_cash_matches_signed_cash_movements(
            movements in prop::collection::vec(arb_movement(), 0..64),
            opening in 0i64..100_000_000,
        ) {
            let summary = summarize(&movements, Money::from_cents(opening)).unwrap();
            let cash_net: i64 = movements
                .iter()
                .filter(|m| m.payment_method == PaymentMethod::Cash)
                .map(|m| m.signed_amount().cents())
                .sum();
            let all_net: i64 = movements.iter().map(|m| m.signed_amount().cents()).sum();

            prop_assert_eq!(summary.expected_cash_cents, opening + cash_net);
            prop_assert_eq!(summary.total_net_cents, all_net);
        }
    }
}
