//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Command-line overrides
//! 2. Environment variables (MACMODELS_*)
//! 3. TOML config file (if MACMODELS_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::crawler::CrawlSettings;
use crate::policy::Policy;

mod validation;

pub use validation::ConfigError;

/// Default lookup endpoint; the product code is passed as the `cc` query parameter.
pub const DEFAULT_ENDPOINT: &str = "http://support-sp.apple.com/sp/product";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Command-line overrides passed to [`AppConfig::load_with`]
/// 2. Environment variables (MACMODELS_*)
/// 3. TOML config file (if MACMODELS_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the product database.
    ///
    /// Set via MACMODELS_DATABASE environment variable.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Days before a not-found code is checked again (pending codes: half).
    ///
    /// Set via MACMODELS_RETENTION_DAYS environment variable.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Save after this many non-successful lookups.
    ///
    /// Set via MACMODELS_SAVENUM environment variable.
    #[serde(default = "default_savenum")]
    pub savenum: u32,

    /// Re-query codes that already have a name.
    ///
    /// Set via MACMODELS_FORCE environment variable.
    #[serde(default)]
    pub force: bool,

    /// Pause after a failed lookup, in milliseconds.
    ///
    /// Set via MACMODELS_EXCEPTION_PAUSE_MS environment variable.
    #[serde(default = "default_exception_pause_ms")]
    pub exception_pause_ms: u64,

    /// Lookup endpoint URL.
    ///
    /// Set via MACMODELS_ENDPOINT environment variable.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via MACMODELS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Fixed User-Agent; a browser-like one is picked per request when unset.
    ///
    /// Set via MACMODELS_USER_AGENT environment variable.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_database() -> PathBuf {
    PathBuf::from("Products.zjson")
}

fn default_retention_days() -> u32 {
    90
}

fn default_savenum() -> u32 {
    2048
}

fn default_exception_pause_ms() -> u64 {
    1_000
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            retention_days: default_retention_days(),
            savenum: default_savenum(),
            force: false,
            exception_pause_ms: default_exception_pause_ms(),
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            user_agent: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Crawl tunables derived from this configuration.
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            policy: Policy { retention_days: self.retention_days, force: self.force },
            savenum: self.savenum,
            exception_pause: Duration::from_millis(self.exception_pause_ms),
        }
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(NoOverrides {})
    }

    /// Load configuration with `overrides` layered on top of every other source.
    ///
    /// Overrides are typically the command-line flags the user actually passed,
    /// serialized with unset fields skipped.
    pub fn load_with(overrides: impl Serialize) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MACMODELS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(
                Env::prefixed("MACMODELS_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into()),
            )
            .merge(Serialized::defaults(overrides));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[derive(Serialize)]
struct NoOverrides {}
