//! # OctopusTrack Cash API
//!
//! HTTP server for the cash register core.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Cash API Routes                               │
//! │                                                                         │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────────┐│
//! │  │  Register lifecycle        │  │  Ledger                            ││
//! │  │                            │  │                                    ││
//! │  │ • GET  /cash/current       │  │ • GET  /cash/{id}/movements        ││
//! │  │ • POST /cash/open          │  │ • POST /cash/{id}/movements        ││
//! │  │ • POST /cash/{id}/close    │  │ • POST /cash/voucher-events        ││
//! │  │ • GET  /cash/history       │  │                                    ││
//! │  └────────────────────────────┘  └────────────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────────────────┐  ┌────────────────────────────────────┐│
//! │  │  Reconciliation            │  │  Ops                               ││
//! │  │                            │  │                                    ││
//! │  │ • GET  /cash/{id}/summary  │  │ • GET  /health                     ││
//! │  │ • GET  /cash/{id}/report   │  │                                    ││
//! │  └────────────────────────────┘  └────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every `/cash` route requires `X-Business-Id` and `X-Operator-Id`, set by
//! the authenticating gateway in front of this service.
//!
//! ## Configuration
//! See [`config`] for the `octo.toml` format and the `OCTO_*` environment
//! overrides.

pub mod config;
pub mod context;
pub mod error;
pub mod routes;

use std::sync::Arc;

use octo_db::Database;

// Re-exports
pub use config::ApiConfig;
pub use context::OperatorContext;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::build_router;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
