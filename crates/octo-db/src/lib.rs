//! # octo-db: Database Layer for the OctopusTrack Cash Register
//!
//! Persistence for registers and their movement ledgers, using SQLite
//! through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Cash Register Data Flow                             │
//! │                                                                         │
//! │  POST /cash/{id}/close                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     octo-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ CashRegister   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Repository     │    │ 001_cash_    │  │   │
//! │  │   │ RegisterPolicy│    │ Movement       │    │ registers.sql│  │   │
//! │  │   │               │    │ Repository     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Register and movement repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use octo_core::{CloseRequest, Money};
//! use octo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cash.db")).await?;
//!
//! let register = db.registers().open("biz1", Money::from_cents(100_000), "ana").await?;
//! let request = CloseRequest { counted_cash_cents: 100_000, difference_reason: None };
//! db.registers().close("biz1", &register.id, &request, "ana").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::movement::MovementRepository;
pub use repository::register::CashRegisterRepository;
