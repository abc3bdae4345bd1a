//! Engine configuration.

use std::env;

use thiserror::Error;

/// Environment variable overriding the installment cadence.
pub const CADENCE_ENV: &str = "LOAN_CADENCE_DAYS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LOAN_CADENCE_DAYS must be a positive number of days, got '{0}'")]
    InvalidCadence(String),

    #[error("cadence must be at least one day")]
    ZeroCadence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    cadence_days: u32,
}

impl EngineConfig {
    /// Weekly installments.
    pub const DEFAULT_CADENCE_DAYS: u32 = 7;

    pub fn new(cadence_days: u32) -> Result<Self, ConfigError> {
        if cadence_days == 0 {
            return Err(ConfigError::ZeroCadence);
        }
        Ok(Self { cadence_days })
    }

    /// Days between consecutive installments of newly created loans.
    pub fn cadence_days(&self) -> u32 {
        self.cadence_days
    }

    /// Build a config from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CADENCE_ENV) {
            Ok(raw) => Self::parse_cadence(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    fn parse_cadence(raw: &str) -> Result<Self, ConfigError> {
        raw.trim()
            .parse::<u32>()
            .ok()
            .and_then(|days| Self::new(days).ok())
            .ok_or_else(|| ConfigError::InvalidCadence(raw.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cadence_days: Self::DEFAULT_CADENCE_DAYS,
        }
    }
}
