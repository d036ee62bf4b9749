//! Configuration for storage and the demo runtime.
//!
//! Every value has a sensible default; `TABTODO_*` environment variables
//! override them.
//!
//! | variable | default |
//! |----------|---------|
//! | `TABTODO_MAX_SAVE_ATTEMPTS` | 3 |
//! | `TABTODO_RETRY_DELAY_MS` | 100 |
//! | `TABTODO_NEAR_CAPACITY_RATIO` | 0.9 |
//! | `TABTODO_SESSION_QUOTA_BYTES` | 5242880 |
//!
//! # Example
//!
//! ```no_run
//! use tabtodo::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! println!("Save attempts: {}", config.storage.max_attempts);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    ParseError {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
    },
    /// Configuration validation failed
    ValidationError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseError { var, value } => {
                write!(f, "Failed to parse configuration: {var}={value}")
            },
            Self::ValidationError(msg) => write!(f, "Configuration validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Storage wrapper configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Total write attempts per save, including the first
    pub max_attempts: u32,
    /// Backoff step; the n-th retry waits `n * retry_delay`
    pub retry_delay: Duration,
    /// Usage ratio at which storage is reported as near capacity
    pub near_capacity_ratio: f64,
}

impl StorageConfig {
    /// Set the number of write attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff step
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Validate storage configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_attempts must be > 0".to_string(),
            ));
        }
        if !(self.near_capacity_ratio > 0.0 && self.near_capacity_ratio <= 1.0) {
            return Err(ConfigError::ValidationError(
                "near_capacity_ratio must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(100),
            near_capacity_ratio: 0.9,
        }
    }
}

/// Default quota for the in-memory session store, matching browser session storage
pub const DEFAULT_SESSION_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Complete application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Storage wrapper settings
    pub storage: StorageConfig,
    /// Byte quota of the session store
    pub session_quota_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            session_quota_bytes: DEFAULT_SESSION_QUOTA_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or the result is invalid
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(attempts) = parse_var(&lookup, "TABTODO_MAX_SAVE_ATTEMPTS")? {
            config.storage.max_attempts = attempts;
        }
        if let Some(delay_ms) = parse_var::<u64, _>(&lookup, "TABTODO_RETRY_DELAY_MS")? {
            config.storage.retry_delay = Duration::from_millis(delay_ms);
        }
        if let Some(ratio) = parse_var(&lookup, "TABTODO_NEAR_CAPACITY_RATIO")? {
            config.storage.near_capacity_ratio = ratio;
        }
        if let Some(quota) = parse_var(&lookup, "TABTODO_SESSION_QUOTA_BYTES")? {
            config.session_quota_bytes = quota;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration
    ///
    /// # Errors
    ///
    /// Returns error if any section is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        if self.session_quota_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "session_quota_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::ParseError {
            var: var.to_string(),
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.max_attempts, 3);
        assert_eq!(config.storage.retry_delay, Duration::from_millis(100));
    }

    #[test]
    fn variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TABTODO_MAX_SAVE_ATTEMPTS", "5"),
            ("TABTODO_RETRY_DELAY_MS", " 20 "),
            ("TABTODO_SESSION_QUOTA_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.storage.max_attempts, 5);
        assert_eq!(config.storage.retry_delay, Duration::from_millis(20));
        assert_eq!(config.session_quota_bytes, 1024);
    }

    #[test]
    fn unparseable_variable_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[("TABTODO_RETRY_DELAY_MS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to parse configuration: TABTODO_RETRY_DELAY_MS=soon"
        );
    }

    #[test]
    fn invalid_values_fail_validation() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("TABTODO_MAX_SAVE_ATTEMPTS", "0")])),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("TABTODO_NEAR_CAPACITY_RATIO", "1.5")])),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
