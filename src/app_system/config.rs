//! Environment-driven runtime settings.

use std::str::FromStr;

use mockable::Env;
use serde::{Deserialize, Serialize};

const CHANNEL_BUFFER_ENV: &str = "SOUK_CHANNEL_BUFFER";
const MAX_STORES_ENV: &str = "SOUK_MAX_STORES_PER_USER";
const LOG_ENV: &str = "SOUK_LOG";

/// Errors raised while reading configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Mailbox size of every repository actor.
    pub channel_buffer: usize,
    pub max_stores_per_user: usize,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 64,
            max_stores_per_user: 4,
            log_filter: "info".to_string(),
        }
    }
}

impl MarketConfig {
    /// Reads `SOUK_*` variables, falling back to defaults for unset ones.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            channel_buffer: parse_or(env, CHANNEL_BUFFER_ENV, defaults.channel_buffer)?,
            max_stores_per_user: parse_or(env, MAX_STORES_ENV, defaults.max_stores_per_user)?,
            log_filter: env
                .string(LOG_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_buffer == 0 {
            return Err(ConfigError::Zero(CHANNEL_BUFFER_ENV));
        }
        if self.max_stores_per_user == 0 {
            return Err(ConfigError::Zero(MAX_STORES_ENV));
        }
        Ok(())
    }
}

fn parse_or<E: Env, T: FromStr>(env: &E, name: &str, default: T) -> Result<T, ConfigError> {
    match env.string(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
    }
}
