//! Remote restart of a failing target through the hosting platform's API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use keepalive_config::RestartSettings;

use crate::error::{HealthResult, RestartError};

/// Issues one authenticated restart request.
#[async_trait]
pub trait Restarter: Send + Sync {
    async fn restart(&self, restartable_id: &str) -> Result<(), RestartError>;
}

/// Restarts a hosted space with `POST {api_base}/{id}/restart`.
pub struct SpaceRestarter {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
    timeout: Duration,
    warned_unconfigured: AtomicBool,
}

impl SpaceRestarter {
    pub fn new(settings: &RestartSettings) -> HealthResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, settings))
    }

    fn with_client(client: reqwest::Client, settings: &RestartSettings) -> Self {
        Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            timeout: settings.timeout,
            warned_unconfigured: AtomicBool::new(false),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    fn restart_url(&self, restartable_id: &str) -> String {
        format!("{}/{}/restart", self.api_base, restartable_id)
    }
}

#[async_trait]
impl Restarter for SpaceRestarter {
    async fn restart(&self, restartable_id: &str) -> Result<(), RestartError> {
        let Some(token) = self.token.as_deref() else {
            if !self.warned_unconfigured.swap(true, Ordering::Relaxed) {
                warn!(%restartable_id, "restart token not set, cannot restart");
            } else {
                debug!(%restartable_id, "restart skipped, token not set");
            }
            return Err(RestartError::NotConfigured);
        };

        let url = self.restart_url(restartable_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(%restartable_id, error = %e, "restart request failed");
                RestartError::Transport(e.to_string())
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            info!(%restartable_id, "restart accepted");
            Ok(())
        } else {
            error!(%restartable_id, %status, "restart rejected");
            Err(RestartError::Rejected(status.as_u16()))
        }
    }
}
