//! Domain types for the status ledger.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health-check URL; doubles as the target's unique key.
pub type TargetUrl = String;

// ── Target ────────────────────────────────────────────────────────

/// A monitored endpoint from the static roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: TargetUrl,
    /// Time between scheduled checks. Always non-zero.
    pub interval: Duration,
    /// Identifier handed to the restart API. Only restart-capable
    /// targets carry one.
    pub restartable_id: Option<String>,
}

impl Target {
    /// Plain keep-alive target without restart capability.
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            url: url.into(),
            interval,
            restartable_id: None,
        }
    }

    /// Attach a restart identifier.
    pub fn with_restart(mut self, restartable_id: impl Into<String>) -> Self {
        self.restartable_id = Some(restartable_id.into());
        self
    }

    pub fn is_restartable(&self) -> bool {
        self.restartable_id.is_some()
    }
}

// ── Health ────────────────────────────────────────────────────────

/// Result of the most recent completed retry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No tick has completed yet.
    #[default]
    Unknown,
    Ok,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Unknown => "unknown",
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        }
    }
}

/// Latest observed state of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealthRecord {
    /// When the last retry sequence finished.
    pub last_checked_at: Option<DateTime<Utc>>,
    pub outcome: Outcome,
    /// Attempts consumed by the last retry sequence (0 while unknown).
    pub attempts_used: u32,
    /// Failed sequences since the last success or successful restart.
    pub consecutive_failures: u32,
    pub last_restart_at: Option<DateTime<Utc>>,
    pub total_restarts: u64,
}

impl HealthRecord {
    /// Initial record for a target that has not been checked yet.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Record the result of a finished retry sequence.
    ///
    /// Success clears the failure streak; failure extends it by one.
    /// Restart bookkeeping is carried over unchanged.
    pub fn observe(&self, outcome: Outcome, attempts_used: u32, at: DateTime<Utc>) -> Self {
        let consecutive_failures = match outcome {
            Outcome::Failed => self.consecutive_failures.saturating_add(1),
            Outcome::Ok | Outcome::Unknown => 0,
        };
        Self {
            last_checked_at: Some(at),
            outcome,
            attempts_used,
            consecutive_failures,
            last_restart_at: self.last_restart_at,
            total_restarts: self.total_restarts,
        }
    }

    /// Record a confirmed successful restart.
    pub fn restarted(&self, at: DateTime<Utc>) -> Self {
        Self {
            consecutive_failures: 0,
            last_restart_at: Some(at),
            total_restarts: self.total_restarts.saturating_add(1),
            ..self.clone()
        }
    }
}

// ── Process ───────────────────────────────────────────────────────

/// Process-wide facts fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessState {
    pub start_time: DateTime<Utc>,
}

impl ProcessState {
    /// Capture the current time as the process start.
    pub fn started_now() -> Self {
        Self {
            start_time: Utc::now(),
        }
    }

    /// Whole seconds elapsed between start and `now`, clamped at zero.
    pub fn uptime_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.start_time).num_seconds().max(0) as u64
    }
}
