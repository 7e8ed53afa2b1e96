//! Read model served at `/status` and rendered by the dashboard.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Aggregate status of the pinger and every target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Always `"online"` while the process can answer.
    pub status: String,
    pub uptime_seconds: u64,
    pub workers: BTreeMap<TargetUrl, WorkerStatus>,
}

/// Per-target view of a `HealthRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStatus {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_ping: Option<DateTime<Utc>>,
    pub status: Outcome,
    pub attempts: u32,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_restart_time: Option<DateTime<Utc>>,
    pub total_restarts: u64,
}

impl From<&HealthRecord> for WorkerStatus {
    fn from(record: &HealthRecord) -> Self {
        Self {
            last_ping: record.last_checked_at,
            status: record.outcome,
            attempts: record.attempts_used,
            consecutive_failures: record.consecutive_failures,
            last_restart_time: record.last_restart_at,
            total_restarts: record.total_restarts,
        }
    }
}

impl StatusReport {
    /// Build the report from a ledger snapshot.
    pub fn build(
        process: &ProcessState,
        snapshot: &BTreeMap<TargetUrl, HealthRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: "online".to_string(),
            uptime_seconds: process.uptime_seconds(now),
            workers: snapshot
                .iter()
                .map(|(url, record)| (url.clone(), WorkerStatus::from(record)))
                .collect(),
        }
    }
}
