//! Monitor — the scheduler that runs one background job per target.
//!
//! Each target gets its own task driving a `tokio::time::interval`. A
//! tick runs the full pipeline in a freshly spawned task which the job
//! loop awaits, so a target's ticks never overlap and a panic inside one
//! tick is contained to that tick. Ticks that come due while the
//! previous one is still in flight are skipped; the job resumes at the
//! next slot of its original schedule. A separate job pings
//! the process's own `/healthz` to keep the host from idling it out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use keepalive_config::Settings;
use keepalive_state::{StatusLedger, Target};

use crate::error::{HealthError, HealthResult};
use crate::pipeline::Pipeline;
use crate::probe::HttpProber;
use crate::restart::SpaceRestarter;

/// Job key of the self-liveness job.
pub const SELF_PING_JOB: &str = "self-ping";

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how often the process pings itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfPing {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Owns the recurring jobs for the whole roster.
pub struct Monitor {
    targets: Vec<Target>,
    pipeline: Arc<Pipeline>,
    self_ping: Option<SelfPing>,
    /// Active jobs: target url (or `SELF_PING_JOB`) → task.
    jobs: RwLock<HashMap<String, JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    drain_timeout: Duration,
}

impl Monitor {
    /// Create a monitor for `targets`. Nothing runs until `start()`.
    pub fn new(targets: Vec<Target>, pipeline: Arc<Pipeline>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            targets,
            pipeline,
            self_ping: None,
            jobs: RwLock::new(HashMap::new()),
            shutdown_tx,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Wire up the HTTP prober and restarter from resolved settings.
    pub fn from_settings(settings: &Settings, ledger: StatusLedger) -> HealthResult<Self> {
        let prober = Arc::new(HttpProber::new()?);
        let restarter = Arc::new(SpaceRestarter::new(&settings.restart)?);
        let pipeline = Arc::new(Pipeline::new(prober, restarter, ledger, &settings.monitor));

        Ok(Self::new(settings.targets.clone(), pipeline).with_self_ping(SelfPing {
            url: format!("http://127.0.0.1:{}/healthz", settings.port),
            interval: settings.monitor.self_ping_interval,
            timeout: settings.monitor.self_ping_timeout,
        }))
    }

    pub fn with_self_ping(mut self, self_ping: SelfPing) -> Self {
        self.self_ping = Some(self_ping);
        self
    }

    /// How long `stop()` waits for jobs before aborting them.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &StatusLedger {
        self.pipeline.ledger()
    }

    /// Seed the ledger and spawn every job.
    ///
    /// Fails if the monitor was already started, even if since stopped.
    pub async fn start(&self) -> HealthResult<()> {
        let mut jobs = self.jobs.write().await;
        if !jobs.is_empty() || *self.shutdown_tx.borrow() {
            return Err(HealthError::AlreadyStarted);
        }

        self.pipeline.ledger().register(&self.targets).await;

        for target in &self.targets {
            let handle = tokio::spawn(run_target_loop(
                target.clone(),
                self.pipeline.clone(),
                self.shutdown_tx.subscribe(),
            ));
            jobs.insert(target.url.clone(), handle);
            info!(
                url = %target.url,
                interval_secs = target.interval.as_secs(),
                restartable_id = target.restartable_id.as_deref().unwrap_or("-"),
                "scheduled ping"
            );
        }

        if let Some(self_ping) = &self.self_ping {
            let handle = tokio::spawn(run_self_ping_loop(
                self_ping.clone(),
                self.pipeline.clone(),
                self.shutdown_tx.subscribe(),
            ));
            jobs.insert(SELF_PING_JOB.to_string(), handle);
            debug!(url = %self_ping.url, "self-ping scheduled");
        }

        info!(jobs = jobs.len(), "scheduler started");
        Ok(())
    }

    /// Stop scheduling new ticks and wait briefly for running ones.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let draining: Vec<_> = self.jobs.write().await.drain().collect();
        let deadline = Instant::now() + self.drain_timeout;
        for (name, mut handle) in draining {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                debug!(job = %name, "job abandoned at shutdown");
            }
        }
        info!("scheduler shut down");
    }

    /// Names of jobs that have been started and not stopped.
    pub async fn active_jobs(&self) -> Vec<String> {
        let jobs = self.jobs.read().await;
        jobs.keys().cloned().collect()
    }

    pub async fn is_running(&self) -> bool {
        !self.jobs.read().await.is_empty()
    }
}

/// First schedule slot strictly after `now` for a job that began at `start`.
///
/// Slots that passed while a tick was running are dropped, not made up.
fn next_slot(start: Instant, period: Duration, now: Instant) -> Instant {
    let period_nanos = period.as_nanos().max(1);
    let slots = now.saturating_duration_since(start).as_nanos() / period_nanos + 1;
    u64::try_from(slots * period_nanos)
        .ok()
        .and_then(|offset| start.checked_add(Duration::from_nanos(offset)))
        .unwrap_or(now + period)
}

/// The recurring job for one target.
async fn run_target_loop(
    target: Target,
    pipeline: Arc<Pipeline>,
    mut shutdown: watch::Receiver<bool>,
) {
    let start = Instant::now();
    let mut ticker = tokio::time::interval_at(start + target.interval, target.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                debug!(url = %target.url, "job shutting down");
                break;
            }
            _ = ticker.tick() => {
                // Owned by the job: aborting the job aborts the tick too.
                let mut tick = JoinSet::new();
                let tick_pipeline = pipeline.clone();
                let tick_target = target.clone();
                tick.spawn(async move { tick_pipeline.run_tick(&tick_target).await });
                match tick.join_next().await {
                    Some(Ok(report)) => {
                        debug!(url = %target.url, ?report, "tick finished");
                    }
                    Some(Err(e)) => {
                        error!(url = %target.url, error = %e, "tick aborted");
                    }
                    None => {}
                }
                ticker.reset_at(next_slot(start, target.interval, Instant::now()));
            }
        }
    }
}

/// Lightweight local liveness check; never touches the ledger.
async fn run_self_ping_loop(
    self_ping: SelfPing,
    pipeline: Arc<Pipeline>,
    mut shutdown: watch::Receiver<bool>,
) {
    let start = Instant::now();
    let mut ticker = tokio::time::interval_at(start + self_ping.interval, self_ping.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                debug!("self-ping shutting down");
                break;
            }
            _ = ticker.tick() => {
                match pipeline.prober().probe(&self_ping.url, self_ping.timeout).await {
                    Ok(()) => info!("self-ping succeeded"),
                    Err(e) => warn!(error = %e, "self-ping failed"),
                }
                ticker.reset_at(next_slot(start, self_ping.interval, Instant::now()));
            }
        }
    }
}
