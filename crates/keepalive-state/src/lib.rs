//! keepalive-state — in-memory status ledger for keepalive.
//!
//! Holds the per-target `HealthRecord`s written by the monitor pipeline
//! and read by the status API and dashboard.
//!
//! # Architecture
//!
//! Records are replaced whole on every write, never mutated field by
//! field in place, so concurrent readers always see a record from a
//! single pipeline step. `StatusReport` is the read model served at
//! `/status` and rendered by the dashboard.
//!
//! The `StatusLedger` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<RwLock<..>>`) and can be shared across async tasks. Nothing is
//! persisted; state is lost on restart.

pub mod ledger;
pub mod report;
pub mod types;

pub use ledger::StatusLedger;
pub use report::{StatusReport, WorkerStatus};
pub use types::*;
