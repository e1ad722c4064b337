//! Engine configuration loaded from environment variables.
//!
//! All values have working defaults so embedding apps and tests can use
//! `EngineConfig::default()` without any environment setup.

use std::env;

/// Engine configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Months subscribed before the reference month of a date window.
    pub window_months_before: u32,
    /// Months subscribed after the reference month of a date window.
    pub window_months_after: u32,
    /// Concurrency cap for batched notification cancels.
    pub max_concurrent_dispatch: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Previous, current, next month: the classic 3-shard window.
            window_months_before: 1,
            window_months_after: 1,
            max_concurrent_dispatch: 16,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable values are
    /// an error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();
        Ok(Self {
            window_months_before: parse_var(
                "HEARTH_SYNC_WINDOW_BEFORE",
                defaults.window_months_before,
            )?,
            window_months_after: parse_var(
                "HEARTH_SYNC_WINDOW_AFTER",
                defaults.window_months_after,
            )?,
            max_concurrent_dispatch: parse_var(
                "HEARTH_SYNC_MAX_CONCURRENT_DISPATCH",
                defaults.max_concurrent_dispatch,
            )?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
