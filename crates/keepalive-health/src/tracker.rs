//! Consecutive-failure tracking and the restart threshold.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use keepalive_config::MonitorSettings;
use keepalive_state::{HealthRecord, Outcome, StatusLedger, Target};

use crate::retry::RetryOutcome;

/// Ledger record after an outcome was applied, plus the restart decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub record: HealthRecord,
    /// Target is restart-capable and its failure streak reached the threshold.
    pub should_restart: bool,
}

/// Applies retry outcomes to the ledger and decides on restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTracker {
    threshold: u32,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(settings.failure_threshold)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether `record` calls for restarting `target`.
    pub fn should_restart(&self, target: &Target, record: &HealthRecord) -> bool {
        target.is_restartable()
            && record.outcome == Outcome::Failed
            && record.consecutive_failures >= self.threshold
    }

    /// Fold a finished retry sequence into the target's record.
    ///
    /// The increment and the threshold comparison both act on the record
    /// produced under the ledger's write lock.
    pub async fn record_outcome(
        &self,
        ledger: &StatusLedger,
        target: &Target,
        result: &RetryOutcome,
        at: DateTime<Utc>,
    ) -> Verdict {
        let mut previous = Outcome::Unknown;
        let record = ledger
            .update(&target.url, |current| {
                previous = current.outcome;
                current.observe(result.outcome, result.attempts_used, at)
            })
            .await;

        match record.outcome {
            Outcome::Ok if previous == Outcome::Failed => {
                debug!(url = %target.url, attempts = record.attempts_used, "target recovered");
            }
            Outcome::Failed => {
                warn!(
                    url = %target.url,
                    consecutive_failures = record.consecutive_failures,
                    threshold = self.threshold,
                    "all attempts failed"
                );
            }
            _ => {}
        }

        let should_restart = self.should_restart(target, &record);
        Verdict {
            record,
            should_restart,
        }
    }

    /// Apply a confirmed restart: clear the streak and count the restart.
    pub async fn record_restart(
        &self,
        ledger: &StatusLedger,
        target: &Target,
        at: DateTime<Utc>,
    ) -> HealthRecord {
        ledger.update(&target.url, |current| current.restarted(at)).await
    }
}
