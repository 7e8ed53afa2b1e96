//! keepalive.toml configuration parser.
//!
//! The raw file shape (`KeepaliveConfig`) keeps everything optional and
//! stringly typed, the way it is written by hand. `resolve()` applies
//! defaults, parses durations, reads the restart credential from the
//! environment, and validates the roster into `Settings`.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use keepalive_state::Target;

use crate::duration::parse_duration;
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_SELF_PING_INTERVAL: Duration = Duration::from_secs(2 * 60);
pub const DEFAULT_SELF_PING_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESTART_API_BASE: &str = "https://huggingface.co/api/spaces";
pub const DEFAULT_TOKEN_ENV: &str = "HF_RESTART_TOKEN";

/// Upper bound for every configured interval and timeout.
pub const MAX_DURATION: Duration = Duration::from_secs(30 * 24 * 3600);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub restart: RestartConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub probe_timeout: Option<String>,
    pub max_retries: Option<u32>,
    pub base_delay: Option<String>,
    pub failure_threshold: Option<u32>,
    pub self_ping_interval: Option<String>,
    pub self_ping_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestartConfig {
    /// Name of the environment variable holding the bearer token.
    pub token_env: Option<String>,
    pub api_base: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub interval: String,
    pub restartable_id: Option<String>,
}

/// Validated runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub targets: Vec<Target>,
    pub monitor: MonitorSettings,
    pub restart: RestartSettings,
}

/// Timing and threshold knobs for the monitor pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub probe_timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub failure_threshold: u32,
    pub self_ping_interval: Duration,
    pub self_ping_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            self_ping_interval: DEFAULT_SELF_PING_INTERVAL,
            self_ping_timeout: DEFAULT_SELF_PING_TIMEOUT,
        }
    }
}

/// Remote restart endpoint and credential.
#[derive(Clone, PartialEq, Eq)]
pub struct RestartSettings {
    pub api_base: String,
    /// Bearer token; `None` disables restarts.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for RestartSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_RESTART_API_BASE.to_string(),
            token: None,
            timeout: DEFAULT_RESTART_TIMEOUT,
        }
    }
}

// Keep the token out of debug logs.
impl std::fmt::Debug for RestartSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestartSettings")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl KeepaliveConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> ConfigResult<Settings> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `env` to look up environment variables.
    pub fn resolve_with<F>(&self, env: F) -> ConfigResult<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let monitor = self.monitor.resolve()?;
        let restart = self.restart.resolve(&env)?;
        let targets = resolve_targets(&self.targets)?;

        if restart.token.is_none() && targets.iter().any(Target::is_restartable) {
            warn!(
                token_env = self.restart.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV),
                "restart token not set, automatic restarts disabled"
            );
        }

        Ok(Settings {
            port: self.server.port.unwrap_or(DEFAULT_PORT),
            targets,
            monitor,
            restart,
        })
    }
}

impl MonitorConfig {
    fn resolve(&self) -> ConfigResult<MonitorSettings> {
        let settings = MonitorSettings {
            probe_timeout: duration_field(
                "monitor.probe_timeout",
                self.probe_timeout.as_deref(),
                DEFAULT_PROBE_TIMEOUT,
            )?,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            base_delay: duration_field(
                "monitor.base_delay",
                self.base_delay.as_deref(),
                DEFAULT_BASE_DELAY,
            )?,
            failure_threshold: self.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
            self_ping_interval: duration_field(
                "monitor.self_ping_interval",
                self.self_ping_interval.as_deref(),
                DEFAULT_SELF_PING_INTERVAL,
            )?,
            self_ping_timeout: duration_field(
                "monitor.self_ping_timeout",
                self.self_ping_timeout.as_deref(),
                DEFAULT_SELF_PING_TIMEOUT,
            )?,
        };

        if settings.max_retries == 0 {
            return Err(ConfigError::Zero {
                field: "monitor.max_retries".to_string(),
            });
        }
        if settings.failure_threshold == 0 {
            return Err(ConfigError::Zero {
                field: "monitor.failure_threshold".to_string(),
            });
        }
        Ok(settings)
    }
}

impl RestartConfig {
    fn resolve<F>(&self, env: &F) -> ConfigResult<RestartSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_env = self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
        let token = env(token_env).filter(|t| !t.trim().is_empty());
        let api_base = self
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_RESTART_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(RestartSettings {
            api_base,
            token,
            timeout: duration_field(
                "restart.timeout",
                self.timeout.as_deref(),
                DEFAULT_RESTART_TIMEOUT,
            )?,
        })
    }
}

fn resolve_targets(raw: &[TargetConfig]) -> ConfigResult<Vec<Target>> {
    if raw.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(raw.len());
    for t in raw {
        let url = t.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.to_string()));
        }
        if !seen.insert(url.to_string()) {
            return Err(ConfigError::DuplicateTarget(url.to_string()));
        }

        let interval = checked_duration(&format!("interval of {url}"), &t.interval)?;

        targets.push(Target {
            url: url.to_string(),
            interval,
            restartable_id: t
                .restartable_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        });
    }
    Ok(targets)
}

fn duration_field(field: &str, value: Option<&str>, default: Duration) -> ConfigResult<Duration> {
    match value {
        Some(raw) => checked_duration(field, raw),
        None => Ok(default),
    }
}

/// Parse `raw` and keep it within `(0, MAX_DURATION]`.
fn checked_duration(field: &str, raw: &str) -> ConfigResult<Duration> {
    let parsed = parse_duration(raw).ok_or_else(|| ConfigError::InvalidDuration {
        field: field.to_string(),
        value: raw.to_string(),
    })?;
    if parsed.is_zero() {
        return Err(ConfigError::Zero {
            field: field.to_string(),
        });
    }
    if parsed > MAX_DURATION {
        return Err(ConfigError::TooLong {
            field: field.to_string(),
            max_secs: MAX_DURATION.as_secs(),
        });
    }
    Ok(parsed)
}
