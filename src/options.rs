use std::time::Duration;

use serde::Deserialize;

use crate::ConfigError;

const MAX_ATTEMPTS_VAR: &str = "FXCONVERT_MAX_ATTEMPTS";
const BASE_DELAY_VAR: &str = "FXCONVERT_BASE_DELAY_MS";
const MULTIPLIER_VAR: &str = "FXCONVERT_BACKOFF_MULTIPLIER";
const TIMEOUT_VAR: &str = "FXCONVERT_TIMEOUT_MS";

/// Configures per-attempt timeout and retry behavior.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Total attempts allowed for one request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Factor applied to the delay after every retry.
    pub backoff_multiplier: f64,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            timeout_ms: 10_000,
        }
    }
}

impl ClientOptions {
    /// Reads options from `FXCONVERT_*` environment variables.
    ///
    /// Every variable is optional; absent ones keep their default value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let options = Self {
            max_attempts: env_or(MAX_ATTEMPTS_VAR, defaults.max_attempts)?,
            base_delay_ms: env_or(BASE_DELAY_VAR, defaults.base_delay_ms)?,
            backoff_multiplier: env_or(MULTIPLIER_VAR, defaults.backoff_multiplier)?,
            timeout_ms: env_or(TIMEOUT_VAR, defaults.timeout_ms)?,
        };
        options.validate()?;
        Ok(options)
    }

    /// Checks `max_attempts >= 1`, `backoff_multiplier >= 1` and a non-zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Options(
                "max_attempts must be at least 1".to_owned(),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Options(format!(
                "backoff_multiplier must be a finite number >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Options(
                "timeout_ms must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Attempt bound with the `>= 1` invariant enforced.
    pub(crate) fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Multiplier with the `>= 1` invariant enforced.
    pub(crate) fn multiplier(&self) -> f64 {
        if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        }
    }

    pub(crate) fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn env_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty(name)),
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
