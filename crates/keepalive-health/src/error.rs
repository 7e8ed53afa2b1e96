//! Monitor error types.

use thiserror::Error;

/// Why a single probe attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("non-success status {0}")]
    Status(u16),

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Why a remote restart did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestartError {
    #[error("restart credential not configured")]
    NotConfigured,

    #[error("restart rejected with status {0}")]
    Rejected(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by the monitor lifecycle.
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("monitor already started")]
    AlreadyStarted,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type HealthResult<T> = Result<T, HealthError>;
