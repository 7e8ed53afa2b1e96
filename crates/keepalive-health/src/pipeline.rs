//! The per-tick pipeline: retry → failure tracking → optional restart.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use keepalive_config::MonitorSettings;
use keepalive_state::{Outcome, StatusLedger, Target};

use crate::error::RestartError;
use crate::probe::Prober;
use crate::restart::Restarter;
use crate::retry::RetryPolicy;
use crate::tracker::FailureTracker;

/// What the pipeline did about restarting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartAction {
    /// Threshold not reached, or target is not restart-capable.
    NotNeeded,
    Restarted,
    Failed(RestartError),
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: Outcome,
    pub attempts_used: u32,
    /// Streak after the tick, including any reset from a restart.
    pub consecutive_failures: u32,
    pub restart: RestartAction,
}

/// Everything a tick needs, shared by all target jobs.
pub struct Pipeline {
    prober: Arc<dyn Prober>,
    restarter: Arc<dyn Restarter>,
    retry: RetryPolicy,
    tracker: FailureTracker,
    ledger: StatusLedger,
    probe_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        prober: Arc<dyn Prober>,
        restarter: Arc<dyn Restarter>,
        ledger: StatusLedger,
        settings: &MonitorSettings,
    ) -> Self {
        Self {
            prober,
            restarter,
            retry: RetryPolicy::from_settings(settings),
            tracker: FailureTracker::from_settings(settings),
            ledger,
            probe_timeout: settings.probe_timeout,
        }
    }

    pub fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }

    pub fn prober(&self) -> &Arc<dyn Prober> {
        &self.prober
    }

    /// Run one complete tick for `target`.
    ///
    /// Always ends in a ledger write; target failures are reported in the
    /// returned `TickReport`, never as an error.
    pub async fn run_tick(&self, target: &Target) -> TickReport {
        let result = self
            .retry
            .attempt_with_retry(self.prober.as_ref(), &target.url, self.probe_timeout)
            .await;

        let verdict = self
            .tracker
            .record_outcome(&self.ledger, target, &result, Utc::now())
            .await;

        if result.outcome == Outcome::Ok {
            info!(url = %target.url, attempts = result.attempts_used, "pinged");
        }

        let mut consecutive_failures = verdict.record.consecutive_failures;
        let restart = match (&target.restartable_id, verdict.should_restart) {
            (Some(id), true) => match self.restarter.restart(id).await {
                Ok(()) => {
                    let record = self
                        .tracker
                        .record_restart(&self.ledger, target, Utc::now())
                        .await;
                    warn!(
                        url = %target.url,
                        restartable_id = %id,
                        consecutive_failures,
                        total_restarts = record.total_restarts,
                        "failure threshold reached, target restarted"
                    );
                    consecutive_failures = record.consecutive_failures;
                    RestartAction::Restarted
                }
                // The restarter reports a missing token once on its own.
                Err(RestartError::NotConfigured) => {
                    debug!(url = %target.url, restartable_id = %id, "restart disabled, no token");
                    RestartAction::Failed(RestartError::NotConfigured)
                }
                Err(e) => {
                    error!(url = %target.url, restartable_id = %id, error = %e, "restart did not happen");
                    RestartAction::Failed(e)
                }
            },
            _ => RestartAction::NotNeeded,
        };

        TickReport {
            outcome: result.outcome,
            attempts_used: result.attempts_used,
            consecutive_failures,
            restart,
        }
    }
}
