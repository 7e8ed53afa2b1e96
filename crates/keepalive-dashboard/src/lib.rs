//! keepalive-dashboard — server-rendered status page.
//!
//! A read-only view over the same `StatusReport` served at `/status`:
//! overall status, uptime, and one row per roster target. It never
//! writes to the ledger.

pub mod pages;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use keepalive_state::{ProcessState, StatusLedger, Target};

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub ledger: StatusLedger,
    pub process: ProcessState,
    pub roster: Arc<Vec<Target>>,
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::overview))
        .with_state(state)
}
