//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating `keepalive.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: String, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("{field} must not exceed {max_secs}s")]
    TooLong { field: String, max_secs: u64 },

    #[error("no targets configured")]
    NoTargets,

    #[error("duplicate target url: {0}")]
    DuplicateTarget(String),

    #[error("target url must start with http:// or https://: {0}")]
    InvalidUrl(String),
}
