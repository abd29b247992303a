//! # Cash Register Repository
//!
//! Lifecycle transitions and the register directory, applied atomically in
//! SQLite.
//!
//! ## Register Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Register Lifecycle                                │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open() → INSERT status='open'                                  │
//! │         partial UNIQUE(business_id) WHERE status='open' rejects a      │
//! │         second one, even from a concurrent request                     │
//! │                                                                         │
//! │  2. RECORD MOVEMENTS                                                   │
//! │     └── MovementRepository::append() (see movement.rs)                 │
//! │                                                                         │
//! │  3. CLOSE (BEGIN IMMEDIATE transaction)                                │
//! │     ├── wait for the write lock, then read register + movements        │
//! │     ├── CashRegister::prepare_close() → expected, difference, reason   │
//! │     └── UPDATE ... WHERE status='open'                                 │
//! │                  AND movement count = count reconciled                 │
//! │         0 rows → closed by someone else (NotOpen)                      │
//! │                  or a movement slipped in (ConcurrentModification)     │
//! │                                                                         │
//! │  4. HISTORY                                                            │
//! │     └── list_history() → closed registers, most recent first           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every lookup is scoped by `business_id`: another business's register id
//! behaves as if it did not exist.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::movement::fetch_movements;
use octo_core::validation::clamp_history_limit;
use octo_core::{
    CashRegister, CashSummary, CloseRequest, ClosureReport, CoreError, Money, RegisterListing,
    RegisterPolicy, RegisterStatus, RegisterView,
};

/// Repository for register lifecycle and directory operations.
#[derive(Debug, Clone)]
pub struct CashRegisterRepository {
    pool: SqlitePool,
    policy: RegisterPolicy,
}

impl CashRegisterRepository {
    /// Creates a new CashRegisterRepository.
    pub fn new(pool: SqlitePool, policy: RegisterPolicy) -> Self {
        CashRegisterRepository { pool, policy }
    }

    pub fn policy(&self) -> &RegisterPolicy {
        &self.policy
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Opens a new register for the business.
    ///
    /// ## Errors
    /// - `InvalidAmount` if `opening_amount` is negative
    /// - `AlreadyOpen` if the business already has an open register,
    ///   including when a concurrent open wins the race
    pub async fn open(
        &self,
        business_id: &str,
        opening_amount: Money,
        opened_by: &str,
    ) -> DbResult<CashRegister> {
        debug!(
            business_id = %business_id,
            opening_cents = opening_amount.cents(),
            "Opening cash register"
        );

        let now = Utc::now();
        let register = CashRegister::open(business_id, opening_amount, opened_by, now)?;

        if let Some(existing) = fetch_open(&self.pool, business_id).await? {
            return Err(self.already_open(&existing, now));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, business_id, status, opening_amount_cents,
                opened_by, opened_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&register.id)
        .bind(&register.business_id)
        .bind(register.status)
        .bind(register.opening_amount_cents)
        .bind(&register.opened_by)
        .bind(register.opened_at)
        .bind(register.created_at)
        .execute(&self.pool)
        .await;

        if let Err(err) = inserted {
            return match DbError::from(err) {
                // Another request opened one between our check and insert
                DbError::UniqueViolation { .. } => match fetch_open(&self.pool, business_id).await? {
                    Some(existing) => Err(self.already_open(&existing, now)),
                    None => Err(DbError::ConcurrentModification(format!(
                        "open register for business {} changed while opening",
                        business_id
                    ))),
                },
                other => Err(other),
            };
        }

        info!(
            register_id = %register.id,
            business_id = %business_id,
            opening_cents = register.opening_amount_cents,
            opened_by = %opened_by,
            "Cash register opened"
        );

        Ok(register)
    }

    fn already_open(&self, existing: &CashRegister, now: DateTime<Utc>) -> DbError {
        let expired = existing.is_expired_at(now, &self.policy);
        warn!(
            register_id = %existing.id,
            business_id = %existing.business_id,
            expired,
            "Open rejected: register already open"
        );
        CoreError::AlreadyOpen {
            register_id: existing.id.clone(),
            expired,
        }
        .into()
    }

    /// Closes a register after reconciling it against the counted cash.
    ///
    /// ## Errors
    /// - `RegisterNotFound` if the id is unknown for this business
    /// - `NotOpen` if the register is (or concurrently became) closed
    /// - `InvalidAmount` / `ReasonRequired` from the close checks
    /// - `ConcurrentModification` if a movement was appended meanwhile
    ///
    /// On any error nothing is written.
    pub async fn close(
        &self,
        business_id: &str,
        register_id: &str,
        request: &CloseRequest,
        closed_by: &str,
    ) -> DbResult<CashRegister> {
        debug!(
            register_id = %register_id,
            counted_cents = request.counted_cash_cents,
            "Closing cash register"
        );

        let now = Utc::now();
        // Take the write lock up front. A deferred transaction that reads
        // first cannot upgrade once an append has committed after its read.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let mut register = fetch_register(&mut *tx, business_id, register_id)
            .await?
            .ok_or_else(|| CoreError::RegisterNotFound(register_id.to_string()))?;
        register.movements = fetch_movements(&mut *tx, &register.id).await?;

        let closing = match register.prepare_close(request, closed_by, now, &self.policy) {
            Ok(closing) => closing,
            Err(err) => {
                warn!(register_id = %register_id, error = %err, "Close rejected");
                return Err(err.into());
            }
        };

        let result = sqlx::query(
            r#"
            UPDATE cash_registers
            SET status = 'closed',
                closed_at = ?,
                closed_by = ?,
                counted_cash_cents = ?,
                difference_cents = ?,
                difference_reason = ?
            WHERE id = ?
              AND status = 'open'
              AND (SELECT COUNT(*) FROM cash_movements
                   WHERE cash_register_id = ? AND deleted_at IS NULL) = ?
            "#,
        )
        .bind(closing.closed_at)
        .bind(&closing.closed_by)
        .bind(closing.counted_cash.cents())
        .bind(closing.difference.cents())
        .bind(&closing.difference_reason)
        .bind(&register.id)
        .bind(&register.id)
        .bind(closing.movement_count as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

            let still_open = fetch_register(&self.pool, business_id, register_id)
                .await?
                .map(|r| r.is_open())
                .unwrap_or(false);
            if !still_open {
                return Err(CoreError::not_open(register_id).into());
            }

            warn!(
                register_id = %register_id,
                reconciled_movements = closing.movement_count,
                "Close aborted: movement appended during reconciliation"
            );
            return Err(DbError::ConcurrentModification(format!(
                "register {} received movements while closing",
                register_id
            )));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            register_id = %register_id,
            expected_cents = closing.expected_cash.cents(),
            counted_cents = closing.counted_cash.cents(),
            difference_cents = closing.difference.cents(),
            closed_by = %closed_by,
            "Cash register closed"
        );

        register.apply_close(closing);
        Ok(register)
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// The business's open register, without movements.
    pub async fn find_open_for(&self, business_id: &str) -> DbResult<Option<CashRegister>> {
        debug!(business_id = %business_id, "Finding open register");
        fetch_open(&self.pool, business_id).await
    }

    /// The business's open register with its movements and expiry flag.
    pub async fn current(&self, business_id: &str) -> DbResult<Option<RegisterView>> {
        let Some(mut register) = fetch_open(&self.pool, business_id).await? else {
            return Ok(None);
        };
        register.movements = fetch_movements(&self.pool, &register.id).await?;
        Ok(Some(RegisterView::new(register, Utc::now(), &self.policy)))
    }

    /// Any register of the business, with its movements.
    pub async fn get(&self, business_id: &str, register_id: &str) -> DbResult<CashRegister> {
        debug!(register_id = %register_id, "Loading cash register");

        let mut register = fetch_register(&self.pool, business_id, register_id)
            .await?
            .ok_or_else(|| CoreError::RegisterNotFound(register_id.to_string()))?;
        register.movements = fetch_movements(&self.pool, &register.id).await?;
        Ok(register)
    }

    /// Closed registers of the business, most recently closed first.
    ///
    /// `limit` is clamped into `1..=MAX_HISTORY_LIMIT`.
    pub async fn list_history(
        &self,
        business_id: &str,
        limit: i64,
    ) -> DbResult<Vec<RegisterListing>> {
        let limit = clamp_history_limit(limit);
        debug!(business_id = %business_id, limit, "Listing register history");

        let registers: Vec<CashRegister> = sqlx::query_as(
            r#"
            SELECT
                id, business_id, status, opening_amount_cents,
                opened_by, opened_at, closed_by, closed_at,
                counted_cash_cents, difference_cents, difference_reason,
                created_at
            FROM cash_registers
            WHERE business_id = ?
              AND status = ?
              AND deleted_at IS NULL
            ORDER BY closed_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(business_id)
        .bind(RegisterStatus::Closed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        Ok(registers
            .iter()
            .map(|r| r.to_listing(now, &self.policy))
            .collect())
    }

    // =========================================================================
    // Reconciliation Views
    // =========================================================================

    /// Per-method summary of any register of the business.
    pub async fn summary(&self, business_id: &str, register_id: &str) -> DbResult<CashSummary> {
        Ok(self.get(business_id, register_id).await?.summary()?)
    }

    /// Data for the closure document of any register of the business.
    pub async fn report(&self, business_id: &str, register_id: &str) -> DbResult<ClosureReport> {
        let register = self.get(business_id, register_id).await?;
        Ok(ClosureReport::build(register)?)
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

/// Loads a register (without movements) scoped to its business.
pub(crate) async fn fetch_register<'e, E>(
    executor: E,
    business_id: &str,
    register_id: &str,
) -> DbResult<Option<CashRegister>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let register: Option<CashRegister> = sqlx::query_as(
        r#"
        SELECT
            id, business_id, status, opening_amount_cents,
            opened_by, opened_at, closed_by, closed_at,
            counted_cash_cents, difference_cents, difference_reason,
            created_at
        FROM cash_registers
        WHERE id = ? AND business_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(register_id)
    .bind(business_id)
    .fetch_optional(executor)
    .await?;

    Ok(register)
}

/// Loads the business's open register (without movements).
pub(crate) async fn fetch_open<'e, E>(
    executor: E,
    business_id: &str,
) -> DbResult<Option<CashRegister>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let register: Option<CashRegister> = sqlx::query_as(
        r#"
        SELECT
            id, business_id, status, opening_amount_cents,
            opened_by, opened_at, closed_by, closed_at,
            counted_cash_cents, difference_cents, difference_reason,
            created_at
        FROM cash_registers
        WHERE business_id = ? AND status = ? AND deleted_at IS NULL
        "#,
    )
    .bind(business_id)
    .bind(RegisterStatus::Open)
    .fetch_optional(executor)
    .await?;

    Ok(register)
}

// =============================================================================
// Unit Tests
// =============================================================================
