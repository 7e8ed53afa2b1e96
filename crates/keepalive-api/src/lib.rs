//! keepalive-api — HTTP surface of the pinger.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Liveness probe, always `ok` |
//! | GET | `/status` | JSON snapshot of every target |
//! | GET | `/` | Dashboard |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use keepalive_state::{ProcessState, StatusLedger, Target};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub ledger: StatusLedger,
    pub process: ProcessState,
}

/// Build the complete router (liveness + status + dashboard).
pub fn build_router(ledger: StatusLedger, process: ProcessState, roster: Vec<Target>) -> Router {
    let api_state = ApiState {
        ledger: ledger.clone(),
        process,
    };

    let dashboard_state = keepalive_dashboard::DashboardState {
        ledger,
        process,
        roster: Arc::new(roster),
    };

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/status", get(handlers::status).with_state(api_state))
        .merge(keepalive_dashboard::dashboard_router(dashboard_state))
}
