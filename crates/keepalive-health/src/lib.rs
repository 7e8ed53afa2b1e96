//! keepalive-health — scheduled health checks with automatic restart.
//!
//! Pings a fixed roster of targets, retries transient failures with
//! exponential backoff, counts consecutive failed ticks, and asks the
//! hosting platform to restart restart-capable targets once the streak
//! crosses a threshold.
//!
//! # Architecture
//!
//! ```text
//! Monitor
//!   ├── Per-target background job (interval, skip if still running)
//!   │   └── Pipeline::run_tick()
//!   │       ├── RetryPolicy → Prober (HttpProber)
//!   │       ├── FailureTracker → StatusLedger
//!   │       └── Restarter (SpaceRestarter) when the threshold is met
//!   └── Self-ping job → own /healthz
//! ```
//!
//! # Failure handling
//!
//! A tick never fails: probe errors end as a `failed` record, restart
//! errors leave the failure streak untouched so the next failing tick
//! tries again. The streak resets only on a successful probe or a
//! confirmed restart.

pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod probe;
pub mod restart;
pub mod retry;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use error::{HealthError, HealthResult, ProbeError, RestartError};
pub use monitor::{Monitor, SELF_PING_JOB, SelfPing};
pub use pipeline::{Pipeline, RestartAction, TickReport};
pub use probe::{HttpProber, Prober};
pub use restart::{Restarter, SpaceRestarter};
pub use retry::{RetryOutcome, RetryPolicy};
pub use tracker::{FailureTracker, Verdict};
