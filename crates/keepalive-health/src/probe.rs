//! Health probe against a single target url.
//!
//! A probe is one bounded `GET`. Retrying is the caller's business.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{HealthResult, ProbeError};

const USER_AGENT: &str = concat!("keepalive/", env!("CARGO_PKG_VERSION"));

/// Issues one health-check request.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Ok(())` on a 2xx response within `timeout`.
    async fn probe(&self, url: &str, timeout: Duration) -> Result<(), ProbeError>;
}

/// reqwest-backed prober sharing one connection pool across targets.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> HealthResult<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> Result<(), ProbeError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, %url, "health probe request failed");
                classify(e)
            })?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            debug!(%status, %url, "health probe non-2xx");
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

fn classify(e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout
    } else {
        ProbeError::Transport(e.to_string())
    }
}
