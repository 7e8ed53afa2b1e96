//! Route handlers. Read-only: nothing here writes to the ledger.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::debug;

use keepalive_state::StatusReport;

use crate::ApiState;

/// GET /healthz
///
/// Independent of target health: the process is alive even when every
/// target is down.
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /status
pub async fn status(State(state): State<ApiState>) -> Json<StatusReport> {
    let snapshot = state.ledger.snapshot().await;
    debug!(workers = snapshot.len(), "status requested");
    Json(StatusReport::build(&state.process, &snapshot, Utc::now()))
}
