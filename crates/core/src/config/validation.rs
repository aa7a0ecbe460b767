//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from flags, environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `database` or `endpoint` is empty
    /// - `retention_days` or `savenum` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `exception_pause_ms` exceeds 1 minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "database".into(), reason: "must not be empty".into() });
        }

        if self.retention_days == 0 {
            return Err(ConfigError::Invalid {
                field: "retention_days".into(),
                reason: "must be at least 1 day".into(),
            });
        }

        if self.savenum == 0 {
            return Err(ConfigError::Invalid { field: "savenum".into(), reason: "must be greater than 0".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.exception_pause_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "exception_pause_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "endpoint".into(), reason: "must not be empty".into() });
        }

        if self.user_agent.as_deref().is_some_and(str::is_empty) {
            tracing::warn!("user_agent is set but empty; requests will carry an empty User-Agent header");
        }

        Ok(())
    }
}
