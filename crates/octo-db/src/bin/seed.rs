//! # Seed Data Generator
//!
//! Populates the database with a demo business: a few closed registers for
//! the history screen and one open register with movements.
//!
//! ## Usage
//! ```bash
//! # 7 closed registers + 1 open (default)
//! cargo run -p octo-db --bin seed
//!
//! # Custom history length and business
//! cargo run -p octo-db --bin seed -- --registers 30 --business demo-shop
//!
//! # Specify database path
//! cargo run -p octo-db --bin seed -- --db ./data/cash.db
//! ```
//!
//! ## Generated Data
//! Each register gets a deterministic mix of:
//! - Voucher sales across all payment methods
//! - Collections (PAYMENT_RECEIVED) on account
//! - Manual petty-cash income and expenses
//!
//! Closed registers alternate between exact counts and small shortages,
//! so both "no reason" and "reason given" closes show up in the history.

use octo_core::{
    CloseRequest, Money, MovementType, NewMovement, PaymentMethod, VoucherEvent,
};
use octo_db::{Database, DbConfig};
use std::env;

/// Manual movement descriptions
const EXPENSES: &[&str] = &["Insumos de limpieza", "Flete", "Cafe y azucar", "Reparacion"];
const INCOMES: &[&str] = &["Caja chica", "Aporte del dueño", "Reintegro"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut registers: usize = 7;
    let mut db_path = String::from("./octo_dev.db");
    let mut business_id = String::from("demo-business");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--registers" | "-r" => {
                if i + 1 < args.len() {
                    registers = args[i + 1].parse().unwrap_or(7);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--business" | "-b" => {
                if i + 1 < args.len() {
                    business_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("OctopusTrack Cash Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -r, --registers <N>   Closed registers to generate (default: 7)");
                println!("  -b, --business <ID>   Business id (default: demo-business)");
                println!("  -d, --db <PATH>       Database file path (default: ./octo_dev.db)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 OctopusTrack Cash Seed Data Generator");
    println!("=======================================");
    println!("Database:  {}", db_path);
    println!("Business:  {}", business_id);
    println!("Registers: {} closed + 1 open", registers);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if let Some(open) = db.registers().find_open_for(&business_id).await? {
        println!("⚠ Business already has an open register ({})", open.id);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut movements = 0;

    for day in 0..registers {
        let register = db
            .registers()
            .open(&business_id, Money::from_cents(50_000 + (day as i64 % 3) * 10_000), "seed")
            .await?;
        movements += fill_register(&db, &business_id, &register.id, day).await?;

        let expected = db.registers().summary(&business_id, &register.id).await?;

        // Every third day the drawer comes up short
        let (counted, reason) = if day % 3 == 2 {
            (expected.expected_cash_cents - 1_250, Some("Faltante en el cambio".to_string()))
        } else {
            (expected.expected_cash_cents, None)
        };

        let closed = db
            .registers()
            .close(
                &business_id,
                &register.id,
                &CloseRequest {
                    counted_cash_cents: counted,
                    difference_reason: reason,
                },
                "seed",
            )
            .await?;

        println!(
            "  Register {} closed: expected {}, difference {}",
            day + 1,
            expected.expected_cash(),
            closed.difference().unwrap_or_default()
        );
    }

    let open = db
        .registers()
        .open(&business_id, Money::from_cents(50_000), "seed")
        .await?;
    movements += fill_register(&db, &business_id, &open.id, registers).await?;

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} registers, {} movements in {:?}", registers + 1, movements, elapsed);

    let summary = db.registers().summary(&business_id, &open.id).await?;
    println!("  Open register {}: expected cash {}", open.id, summary.expected_cash());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Records a deterministic day of activity. Returns the number of movements.
async fn fill_register(
    db: &Database,
    business_id: &str,
    register_id: &str,
    seed: usize,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut count = 0;

    for n in 0..(8 + seed % 5) {
        let event = VoucherEvent {
            movement_type: if n % 4 == 3 {
                MovementType::PaymentReceived
            } else {
                MovementType::Sale
            },
            payment_method: PaymentMethod::ALL[(seed + n) % PaymentMethod::ALL.len()],
            amount_cents: 1_500 + ((seed * 31 + n * 17) % 400) as i64 * 25,
            description: format!("Factura B 0001-{:08}", seed * 100 + n),
            voucher_id: Some(format!("seed-{}-{}", seed, n)),
        };
        db.movements()
            .record_voucher_event(business_id, &event, "seed")
            .await?;
        count += 1;
    }

    let income = NewMovement::manual(
        MovementType::Income,
        PaymentMethod::Cash,
        Money::from_cents(10_000),
        INCOMES[seed % INCOMES.len()],
    );
    db.movements()
        .append(business_id, register_id, income, "seed")
        .await?;

    let expense = NewMovement::manual(
        MovementType::Expense,
        PaymentMethod::Cash,
        Money::from_cents(2_000 + (seed % 4) as i64 * 500),
        EXPENSES[seed % EXPENSES.len()],
    );
    db.movements()
        .append(business_id, register_id, expense, "seed")
        .await?;

    Ok(count + 2)
}
