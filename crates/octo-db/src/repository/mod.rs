//! # Repository Module
//!
//! SQLite repositories for the cash register.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.registers().close(business, id, &request, operator)        │
//! │       ▼                                                                 │
//! │  CashRegisterRepository            MovementRepository                  │
//! │  ├── open / close                  ├── append                          │
//! │  ├── find_open_for / current       ├── record_voucher_event            │
//! │  ├── get / list_history            └── list                            │
//! │  └── summary / report                                                  │
//! │       │                                     │                           │
//! │       └──────────── octo-core rules ────────┘                           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                    SQLite (sqlx)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories check the octo-core rules first and let SQLite constraints
//! settle the races the rules cannot see.

pub mod movement;
pub mod register;
