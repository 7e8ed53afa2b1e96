//! Dashboard page handlers.

use askama::Template;
use axum::extract::State;
use axum::response::Html;
use chrono::Utc;
use tracing::warn;

use keepalive_state::StatusReport;

use crate::DashboardState;
use crate::views::*;

fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        warn!(error = %e, "dashboard template failed to render");
        format!("<pre>Template error: {e}</pre>")
    }))
}

#[derive(Template)]
#[template(path = "overview.html")]
struct OverviewTemplate {
    view: OverviewView,
}

pub async fn overview(State(state): State<DashboardState>) -> Html<String> {
    let snapshot = state.ledger.snapshot().await;
    let report = StatusReport::build(&state.process, &snapshot, Utc::now());

    render(OverviewTemplate {
        view: OverviewView::build(&report, &state.roster),
    })
}
