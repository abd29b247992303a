//! End-to-end register lifecycle against SQLite.
//!
//! In-memory databases cover the scenarios; the concurrency tests use an
//! on-disk WAL database so several pool connections really race.

use chrono::{Duration, Utc};
use octo_core::{
    CloseRequest, CoreError, Money, MovementType, NewMovement, PaymentMethod, RegisterPolicy,
    RegisterStatus, VoucherEvent,
};
use octo_db::{Database, DbConfig, DbError};
use std::path::PathBuf;

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// On-disk database removed when dropped.
struct TempDb {
    path: PathBuf,
    db: Database,
}

impl TempDb {
    async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("octo-test-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(8))
            .await
            .unwrap();
        TempDb { path, db }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

fn sale(cents: i64) -> VoucherEvent {
    VoucherEvent {
        movement_type: MovementType::Sale,
        payment_method: PaymentMethod::Cash,
        amount_cents: cents,
        description: "Factura B 0001-00000001".to_string(),
        voucher_id: Some("v-1".to_string()),
    }
}

fn close_request(counted: i64, reason: Option<&str>) -> CloseRequest {
    CloseRequest {
        counted_cash_cents: counted,
        difference_reason: reason.map(str::to_string),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_a_manual_income() {
    let db = memory_db().await;
    db.registers()
        .open("biz1", Money::from_cents(100_000), "ana")
        .await
        .unwrap();

    let current = db.registers().current("biz1").await.unwrap().unwrap();
    let income = NewMovement::manual(
        MovementType::Income,
        PaymentMethod::Cash,
        Money::from_cents(50_000),
        "caja chica",
    );
    db.movements()
        .append("biz1", &current.register.id, income, "ana")
        .await
        .unwrap();

    let current = db.registers().current("biz1").await.unwrap().unwrap();
    assert_eq!(current.register.movements.len(), 1);
    assert_eq!(current.register.movements[0].description, "caja chica");
    assert_eq!(current.register.summary().unwrap().expected_cash_cents, 150_000);
}

#[tokio::test]
async fn test_scenario_b_exact_close() {
    let db = memory_db().await;
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();
    db.movements()
        .record_voucher_event("biz1", &sale(30_000), "system")
        .await
        .unwrap();

    let closed = db
        .registers()
        .close("biz1", &register.id, &close_request(30_000, None), "ana")
        .await
        .unwrap();

    assert_eq!(closed.status, RegisterStatus::Closed);
    assert_eq!(closed.difference_cents, Some(0));
    assert_eq!(closed.difference_reason, None);
    assert!(db.registers().current("biz1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_scenario_c_shortage_needs_reason() {
    let db = memory_db().await;
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();
    db.movements()
        .record_voucher_event("biz1", &sale(30_000), "system")
        .await
        .unwrap();

    let err = db
        .registers()
        .close("biz1", &register.id, &close_request(25_000, None), "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::ReasonRequired { .. })));

    // Nothing was written
    let still = db.registers().get("biz1", &register.id).await.unwrap();
    assert_eq!(still.status, RegisterStatus::Open);
    assert_eq!(still.counted_cash_cents, None);

    let closed = db
        .registers()
        .close("biz1", &register.id, &close_request(25_000, Some("faltante")), "ana")
        .await
        .unwrap();
    assert_eq!(closed.difference_cents, Some(-5_000));
    assert_eq!(closed.difference_reason.as_deref(), Some("faltante"));

    // The stored row matches what close returned
    let stored = db.registers().get("biz1", &register.id).await.unwrap();
    assert_eq!(stored.difference_cents, Some(-5_000));
    assert_eq!(stored.closed_by.as_deref(), Some("ana"));
}

#[tokio::test]
async fn test_scenario_d_open_twice() {
    let db = memory_db().await;
    db.registers().open("biz1", Money::from_cents(1_000), "ana").await.unwrap();

    let err = db
        .registers()
        .open("biz1", Money::from_cents(1_000), "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::AlreadyOpen { .. })));
}

// =============================================================================
// Terminal Close
// =============================================================================

#[tokio::test]
async fn test_nothing_succeeds_after_close() {
    let db = memory_db().await;
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();
    db.registers()
        .close("biz1", &register.id, &close_request(0, None), "ana")
        .await
        .unwrap();

    let income = NewMovement::manual(
        MovementType::Income,
        PaymentMethod::Cash,
        Money::from_cents(100),
        "late",
    );
    let err = db
        .movements()
        .append("biz1", &register.id, income, "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::NotOpen { .. })));

    let err = db
        .registers()
        .close("biz1", &register.id, &close_request(0, None), "ana")
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::NotOpen { .. })));

    // A new register can be opened afterwards
    assert!(db.registers().open("biz1", Money::zero(), "ana").await.is_ok());
}

#[tokio::test]
async fn test_ledger_keeps_append_order() {
    let db = memory_db().await;
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();

    let amounts = [700, 100, 2_500, 100, 42];
    for amount in amounts {
        db.movements()
            .record_voucher_event("biz1", &sale(amount), "system")
            .await
            .unwrap();
    }

    let listed = db.movements().list("biz1", &register.id).await.unwrap();
    let listed_amounts: Vec<i64> = listed.iter().map(|m| m.amount_cents).collect();
    let sequences: Vec<i64> = listed.iter().map(|m| m.sequence).collect();
    assert_eq!(listed_amounts, amounts.to_vec());
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_summary_and_report_for_closed_register() {
    let db = memory_db().await;
    let register = db
        .registers()
        .open("biz1", Money::from_cents(10_000), "ana")
        .await
        .unwrap();

    let mut card = sale(4_000);
    card.payment_method = PaymentMethod::Card;
    db.movements().record_voucher_event("biz1", &card, "system").await.unwrap();
    db.movements().record_voucher_event("biz1", &sale(3_000), "system").await.unwrap();
    let expense = NewMovement::manual(
        MovementType::Expense,
        PaymentMethod::Cash,
        Money::from_cents(500),
        "flete",
    );
    db.movements()
        .append("biz1", &register.id, expense, "ana")
        .await
        .unwrap();

    let summary = db.registers().summary("biz1", &register.id).await.unwrap();
    assert_eq!(summary.expected_cash_cents, 12_500);
    assert_eq!(summary.total_net_cents, 6_500);

    db.registers()
        .close("biz1", &register.id, &close_request(12_500, None), "ana")
        .await
        .unwrap();

    let report = db.registers().report("biz1", &register.id).await.unwrap();
    assert_eq!(report.movement_count, 3);
    assert_eq!(report.total_sales_cents, 7_000);
    assert_eq!(report.total_expense_cents, 500);
    assert_eq!(report.cash_net_cents, 2_500);
    assert_eq!(report.register.status, RegisterStatus::Closed);
    assert_eq!(report.summary, summary);
}

// =============================================================================
// Expiry
// =============================================================================

async fn backdate(db: &Database, register_id: &str, hours: i64) {
    sqlx::query("UPDATE cash_registers SET opened_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(hours))
        .bind(register_id)
        .execute(db.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_register_accepts_movements_and_closes() {
    let db = memory_db().await;
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();
    backdate(&db, &register.id, 30).await;

    assert!(db.registers().current("biz1").await.unwrap().unwrap().is_expired);
    assert!(db
        .movements()
        .record_voucher_event("biz1", &sale(100), "system")
        .await
        .is_ok());
    assert!(db
        .registers()
        .close("biz1", &register.id, &close_request(100, None), "ana")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_blocking_policy_rejects_expired_movements() {
    let policy = RegisterPolicy {
        block_expired_movements: true,
        ..RegisterPolicy::default()
    };
    let db = memory_db().await.with_policy(policy);
    let register = db.registers().open("biz1", Money::zero(), "ana").await.unwrap();
    backdate(&db, &register.id, 30).await;

    let err = db
        .movements()
        .record_voucher_event("biz1", &sale(100), "system")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::NotOpen { expired: true, .. })
    ));

    // Closing is still allowed
    assert!(db
        .registers()
        .close("biz1", &register.id, &close_request(0, None), "ana")
        .await
        .is_ok());
}

// =============================================================================
// Concurrency (on-disk)
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_opens_leave_one_register() {
    let temp = TempDb::new().await;

    let mut handles = Vec::new();
    for n in 0..8 {
        let db = temp.db.clone();
        handles.push(tokio::spawn(async move {
            db.registers()
                .open("biz1", Money::from_cents(n * 100), "ana")
                .await
        }));
    }

    let mut opened = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => opened += 1,
            Err(err) => assert!(
                matches!(err, DbError::Core(CoreError::AlreadyOpen { .. })) || err.is_transient(),
                "unexpected error: {err}"
            ),
        }
    }
    assert_eq!(opened, 1);

    let open_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cash_registers WHERE business_id = 'biz1' AND status = 'open'",
    )
    .fetch_one(temp.db.pool())
    .await
    .unwrap();
    assert_eq!(open_rows, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_are_not_lost() {
    let temp = TempDb::new().await;
    let register = temp
        .db
        .registers()
        .open("biz1", Money::zero(), "ana")
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 1..=20 {
        let db = temp.db.clone();
        handles.push(tokio::spawn(async move {
            db.movements()
                .record_voucher_event("biz1", &sale(n), "system")
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = temp.db.movements().list("biz1", &register.id).await.unwrap();
    assert_eq!(listed.len(), 20);
    let sequences: Vec<i64> = listed.iter().map(|m| m.sequence).collect();
    assert_eq!(sequences, (1..=20).collect::<Vec<i64>>());
    assert_eq!(listed.iter().map(|m| m.amount_cents).sum::<i64>(), (1..=20).sum::<i64>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_appends_stays_consistent() {
    let temp = TempDb::new().await;

    for round in 0..10 {
        let register = temp
            .db
            .registers()
            .open("biz1", Money::zero(), "ana")
            .await
            .unwrap();

        let mut appends = Vec::new();
        for n in 1..=10 {
            let db = temp.db.clone();
            appends.push(tokio::spawn(async move {
                db.movements()
                    .record_voucher_event("biz1", &sale(n * 100), "system")
                    .await
            }));
        }

        let db = temp.db.clone();
        let register_id = register.id.clone();
        let close = tokio::spawn(async move {
            // Any count works: a reason is always given
            db.registers()
                .close("biz1", &register_id, &close_request(0, Some("race")), "ana")
                .await
        });

        let mut appended = 0;
        for handle in appends {
            match handle.await.unwrap() {
                Ok(_) => appended += 1,
                Err(err) => assert!(
                    matches!(err, DbError::Core(CoreError::NotOpen { .. })),
                    "round {round}: unexpected append error: {err}"
                ),
            }
        }
        let closed = close
            .await
            .unwrap()
            .unwrap_or_else(|err| panic!("round {round}: close failed: {err}"));

        // The stored difference was computed over exactly the stored ledger
        let stored = temp.db.registers().get("biz1", &register.id).await.unwrap();
        let expected = stored.summary().unwrap().expected_cash_cents;
        assert_eq!(stored.status, RegisterStatus::Closed);
        assert_eq!(stored.movements.len(), appended);
        assert_eq!(stored.difference_cents, Some(-expected));
        assert_eq!(closed.difference_cents, stored.difference_cents);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_closes_close_once() {
    let temp = TempDb::new().await;
    let register = temp
        .db
        .registers()
        .open("biz1", Money::from_cents(1_000), "ana")
        .await
        .unwrap();
    temp.db
        .movements()
        .record_voucher_event("biz1", &sale(500), "system")
        .await
        .unwrap();

    let mut closes = Vec::new();
    for counted in [1_500, 1_400] {
        let db = temp.db.clone();
        let register_id = register.id.clone();
        closes.push(tokio::spawn(async move {
            db.registers()
                .close("biz1", &register_id, &close_request(counted, Some("doble")), "ana")
                .await
        }));
    }

    let mut winners = Vec::new();
    for handle in closes {
        match handle.await.unwrap() {
            Ok(closed) => winners.push(closed),
            Err(err) => assert!(
                matches!(err, DbError::Core(CoreError::NotOpen { .. })),
                "unexpected close error: {err}"
            ),
        }
    }
    assert_eq!(winners.len(), 1);

    let stored = temp.db.registers().get("biz1", &register.id).await.unwrap();
    assert_eq!(stored.status, RegisterStatus::Closed);
    assert_eq!(stored.counted_cash_cents, winners[0].counted_cash_cents);
    assert_eq!(stored.difference_cents, winners[0].difference_cents);
}
