//! View types for dashboard template rendering.
//!
//! Pre-formatted strings only, so the template stays dumb.

use std::time::Duration;

use chrono::SecondsFormat;
use keepalive_state::{Outcome, StatusReport, Target};

pub struct OverviewView {
    pub status: String,
    pub uptime: String,
    pub rows: Vec<TargetRow>,
}

pub struct TargetRow {
    pub url: String,
    pub interval: String,
    pub last_ping: String,
    pub status_icon: &'static str,
    pub status_class: &'static str,
    pub failures: u32,
    pub auto_restart: bool,
    pub total_restarts: u64,
}

impl OverviewView {
    /// One row per roster entry, in roster order.
    pub fn build(report: &StatusReport, roster: &[Target]) -> Self {
        let rows = roster
            .iter()
            .map(|target| {
                let worker = report.workers.get(&target.url);
                let outcome = worker.map(|w| w.status).unwrap_or_default();
                TargetRow {
                    url: target.url.clone(),
                    interval: format_interval(target.interval),
                    last_ping: worker
                        .and_then(|w| w.last_ping)
                        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                        .unwrap_or_else(|| "Not yet".to_string()),
                    status_icon: status_icon(outcome),
                    status_class: outcome.as_str(),
                    failures: worker.map(|w| w.consecutive_failures).unwrap_or(0),
                    auto_restart: target.is_restartable(),
                    total_restarts: worker.map(|w| w.total_restarts).unwrap_or(0),
                }
            })
            .collect();

        Self {
            status: report.status.clone(),
            uptime: format_uptime(report.uptime_seconds),
            rows,
        }
    }
}

fn status_icon(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Ok => "✅",
        Outcome::Failed => "❌",
        Outcome::Unknown => "⏳",
    }
}

/// `3725` → `"1h 2m 5s"`.
pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours}h {minutes}m {secs}s")
}

/// Whole minutes as `"5 min"`, anything else in seconds.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else if secs > 0 {
        format!("{secs} s")
    } else {
        format!("{} ms", interval.as_millis())
    }
}
