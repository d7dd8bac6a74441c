//! Engine configuration loading and representation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockhold_inventory::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const ENV_MAX_TXN_ATTEMPTS: &str = "STOCKHOLD_MAX_TXN_ATTEMPTS";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "STOCKHOLD_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "STOCKHOLD_MAX_PAGE_SIZE";
pub const ENV_RETRY_BASE_DELAY_US: &str = "STOCKHOLD_RETRY_BASE_DELAY_US";
pub const ENV_RETRY_MAX_DELAY_US: &str = "STOCKHOLD_RETRY_MAX_DELAY_US";

/// Hard upper bound for `max_page_size`.
pub const PAGE_SIZE_CEILING: usize = 10_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer (got {value:?})")]
    Malformed { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attempts per transaction before a conflict is surfaced.
    pub max_txn_attempts: u32,
    /// Low-stock page size when the caller gives none.
    pub default_page_size: usize,
    /// Upper clamp for requested page sizes.
    pub max_page_size: usize,
    /// First backoff after a commit conflict, doubled per attempt. 0 only yields.
    pub retry_base_delay_us: u64,
    /// Backoff cap.
    pub retry_max_delay_us: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_txn_attempts: 8,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            retry_base_delay_us: 20,
            retry_max_delay_us: 2_000,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `STOCKHOLD_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_MAX_TXN_ATTEMPTS)? {
            config.max_txn_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_DEFAULT_PAGE_SIZE)? {
            config.default_page_size = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_PAGE_SIZE)? {
            config.max_page_size = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_BASE_DELAY_US)? {
            config.retry_base_delay_us = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MAX_DELAY_US)? {
            config.retry_max_delay_us = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_txn_attempts(mut self, attempts: u32) -> Self {
        self.max_txn_attempts = attempts;
        self
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn with_retry_backoff(mut self, base_us: u64, max_us: u64) -> Self {
        self.retry_base_delay_us = base_us;
        self.retry_max_delay_us = max_us;
        self
    }

    /// Backoff before re-running a body that lost a commit race.
    ///
    /// `attempt` is the 1-based attempt that just conflicted.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(63);
        let delay = self.retry_base_delay_us.saturating_mul(1u64 << shift);
        Duration::from_micros(delay.min(self.retry_max_delay_us))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_txn_attempts == 0 {
            return Err(ConfigError::Invalid("max_txn_attempts must be at least 1".into()));
        }
        if self.max_page_size == 0 || self.max_page_size > PAGE_SIZE_CEILING {
            return Err(ConfigError::Invalid(format!(
                "max_page_size must be within 1..={PAGE_SIZE_CEILING}"
            )));
        }
        if self.retry_base_delay_us > self.retry_max_delay_us {
            return Err(ConfigError::Invalid(
                "retry_base_delay_us cannot exceed retry_max_delay_us".into(),
            ));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size must be within 1..={}",
                self.max_page_size
            )));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Malformed { var, value: raw }),
    }
}
