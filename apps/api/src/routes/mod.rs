//! Axum router for the cash API.
//!
//! `build_router` is the single entry point. Middleware layers (CORS,
//! tracing) are attached by `main.rs` so tests can drive the bare router.

pub mod cash;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

/// Build the complete application router wired to the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/cash/current", get(cash::current))
        .route("/cash/open", post(cash::open))
        .route("/cash/history", get(cash::history))
        .route("/cash/voucher-events", post(cash::voucher_event))
        .route("/cash/{id}/close", post(cash::close))
        .route(
            "/cash/{id}/movements",
            get(cash::list_movements).post(cash::add_movement),
        )
        .route("/cash/{id}/summary", get(cash::summary))
        .route("/cash/{id}/report", get(cash::report))
        .with_state(state)
}
