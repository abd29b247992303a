//! # Movement Repository
//!
//! The append-only ledger of a register.
//!
//! ## Append
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  draft.validated()              InvalidMovement, before any I/O         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load register (business)       RegisterNotFound                        │
//! │  ensure_accepts_movements()     NotOpen (closed, or expired + blocked)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO cash_movements ... SELECT MAX(sequence) + 1                │
//! │  FROM cash_registers WHERE id = ? AND status = 'open'                   │
//! │  RETURNING sequence                                                     │
//! │       │                                                                 │
//! │       ├── no row → register closed in the meantime → NotOpen            │
//! │       └── row    → Movement { sequence }                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The open check and the sequence assignment happen in the same statement,
//! so an append can never land on a register that a close has already
//! reconciled, and `UNIQUE(cash_register_id, sequence)` rejects a duplicate
//! position instead of silently overwriting.

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::register::{fetch_open, fetch_register};
use octo_core::{
    CashRegister, CoreError, Movement, NewMovement, RegisterPolicy, RegisterStatus, VoucherEvent,
};

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
    policy: RegisterPolicy,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool, policy: RegisterPolicy) -> Self {
        MovementRepository { pool, policy }
    }

    pub fn policy(&self) -> &RegisterPolicy {
        &self.policy
    }

    /// Appends a movement to a register of the business.
    ///
    /// ## Errors
    /// - `InvalidMovement` if the draft breaks a ledger rule
    /// - `RegisterNotFound` if the id is unknown for this business
    /// - `NotOpen` if the register is closed (or expired under a blocking
    ///   policy)
    pub async fn append(
        &self,
        business_id: &str,
        register_id: &str,
        draft: NewMovement,
        created_by: &str,
    ) -> DbResult<Movement> {
        let draft = draft.validated()?;

        let register = fetch_register(&self.pool, business_id, register_id)
            .await?
            .ok_or_else(|| CoreError::RegisterNotFound(register_id.to_string()))?;

        self.append_to(&register, draft, created_by).await
    }

    /// Appends the movement implied by a voucher event to the business's
    /// open register.
    ///
    /// ## Errors
    /// - `InvalidMovement` if the event is not a well-formed SALE or
    ///   PAYMENT_RECEIVED
    /// - `NotOpen` if the business has no open register
    pub async fn record_voucher_event(
        &self,
        business_id: &str,
        event: &VoucherEvent,
        created_by: &str,
    ) -> DbResult<Movement> {
        debug!(
            business_id = %business_id,
            voucher_id = ?event.voucher_id,
            movement_type = event.movement_type.as_str(),
            "Recording voucher movement"
        );

        let draft = NewMovement::from_voucher(event).validated()?;

        let register = fetch_open(&self.pool, business_id)
            .await?
            .ok_or_else(CoreError::no_open_register)?;

        self.append_to(&register, draft, created_by).await
    }

    async fn append_to(
        &self,
        register: &CashRegister,
        draft: NewMovement,
        created_by: &str,
    ) -> DbResult<Movement> {
        let now = Utc::now();
        register.ensure_accepts_movements(now, &self.policy)?;

        // Sequence is assigned by the INSERT below
        let mut movement = draft.into_movement(&register.id, 0, created_by, now);

        let sequence: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO cash_movements (
                id, cash_register_id, sequence, movement_type, payment_method,
                amount_cents, description, voucher_id, created_by, created_at
            )
            SELECT
                ?,
                r.id,
                COALESCE(
                    (SELECT MAX(m.sequence) FROM cash_movements m
                     WHERE m.cash_register_id = r.id),
                    0
                ) + 1,
                ?, ?, ?, ?, ?, ?, ?
            FROM cash_registers r
            WHERE r.id = ? AND r.status = ? AND r.deleted_at IS NULL
            RETURNING sequence
            "#,
        )
        .bind(&movement.id)
        .bind(movement.movement_type)
        .bind(movement.payment_method)
        .bind(movement.amount_cents)
        .bind(&movement.description)
        .bind(&movement.voucher_id)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .bind(&register.id)
        .bind(RegisterStatus::Open)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { field, .. } => DbError::ConcurrentModification(format!(
                "ledger position already taken ({})",
                field
            )),
            other => other,
        })?;

        // Closed between the read above and the insert
        let Some(sequence) = sequence else {
            return Err(CoreError::not_open(&register.id).into());
        };
        movement.sequence = sequence;

        info!(
            register_id = %register.id,
            movement_id = %movement.id,
            sequence,
            movement_type = movement.movement_type.as_str(),
            payment_method = movement.payment_method.as_str(),
            amount_cents = movement.amount_cents,
            "Movement recorded"
        );

        Ok(movement)
    }

    /// All movements of a register of the business, in ledger order.
    ///
    /// Works on open and closed registers alike.
    pub async fn list(&self, business_id: &str, register_id: &str) -> DbResult<Vec<Movement>> {
        debug!(register_id = %register_id, "Listing movements");

        if fetch_register(&self.pool, business_id, register_id)
            .await?
            .is_none()
        {
            return Err(CoreError::RegisterNotFound(register_id.to_string()).into());
        }

        fetch_movements(&self.pool, register_id).await
    }
}

/// Loads a register's movements ordered by ledger position.
pub(crate) async fn fetch_movements<'e, E>(executor: E, register_id: &str) -> DbResult<Vec<Movement>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let movements: Vec<Movement> = sqlx::query_as(
        r#"
        SELECT
            id, cash_register_id, sequence, movement_type, payment_method,
            amount_cents, description, voucher_id, created_by, created_at
        FROM cash_movements
        WHERE cash_register_id = ? AND deleted_at IS NULL
        ORDER BY sequence ASC
        "#,
    )
    .bind(register_id)
    .fetch_all(executor)
    .await?;

    Ok(movements)
}

// =============================================================================
// Unit Tests
// =============================================================================
