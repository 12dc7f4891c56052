//! Barber Shop Configuration
//!
//! Parameter set for one simulation run, loaded from a JSON file with a
//! `barber_shop` section and a `logging` section.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors (raised before any thread is started)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("waiting room capacity must be greater than zero")]
    ZeroCapacity,

    #[error("total_customers must be greater than zero")]
    ZeroCustomers,

    #[error("'{field}' must be a finite number")]
    NotFinite { field: &'static str },

    #[error("'{field}' must not be negative")]
    Negative { field: &'static str },

    #[error("'{field}' is too large to be a duration")]
    OutOfRange { field: &'static str },

    #[error("'{field}' must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("'{min_field}' must not exceed '{max_field}'")]
    InvertedRange {
        min_field: &'static str,
        max_field: &'static str,
    },

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

/// Core simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopParams {
    #[serde(rename = "num_waiting_chairs")]
    pub waiting_room_capacity: usize,
    #[serde(rename = "customer_arrival_time_min")]
    pub arrival_time_min: f64, // seconds
    #[serde(rename = "customer_arrival_time_max")]
    pub arrival_time_max: f64, // seconds
    #[serde(rename = "barber_cut_time_min")]
    pub cut_time_min: f64, // seconds
    #[serde(rename = "barber_cut_time_max")]
    pub cut_time_max: f64, // seconds
    pub total_customers: usize,
}

impl ShopParams {
    /// Check the rules the simulation core relies on.
    ///
    /// Zero-length intervals are accepted so that runs can be made
    /// deterministic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waiting_room_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.total_customers == 0 {
            return Err(ConfigError::ZeroCustomers);
        }

        for (field, value) in self.bounds() {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field });
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::OutOfRange { field });
            }
        }

        if self.arrival_time_min > self.arrival_time_max {
            return Err(ConfigError::InvertedRange {
                min_field: "customer_arrival_time_min",
                max_field: "customer_arrival_time_max",
            });
        }
        if self.cut_time_min > self.cut_time_max {
            return Err(ConfigError::InvertedRange {
                min_field: "barber_cut_time_min",
                max_field: "barber_cut_time_max",
            });
        }

        Ok(())
    }

    /// Rules for values coming from a config file: every time must be positive.
    pub fn validate_strict(&self) -> Result<(), ConfigError> {
        self.validate()?;
        for (field, value) in self.bounds() {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field });
            }
        }
        Ok(())
    }

    /// Arrival interval as durations. Values `validate` would reject
    /// saturate.
    pub fn arrival_range(&self) -> (Duration, Duration) {
        (secs(self.arrival_time_min), secs(self.arrival_time_max))
    }

    /// Service interval as durations
    pub fn cut_range(&self) -> (Duration, Duration) {
        (secs(self.cut_time_min), secs(self.cut_time_max))
    }

    fn bounds(&self) -> [(&'static str, f64); 4] {
        [
            ("customer_arrival_time_min", self.arrival_time_min),
            ("customer_arrival_time_max", self.arrival_time_max),
            ("barber_cut_time_min", self.cut_time_min),
            ("barber_cut_time_max", self.cut_time_max),
        ]
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 { Duration::MAX } else { Duration::ZERO })
}

impl Default for ShopParams {
    fn default() -> Self {
        Self {
            waiting_room_capacity: 3,
            arrival_time_min: 0.5,
            arrival_time_max: 1.5,
            cut_time_min: 1.0,
            cut_time_max: 2.0,
            total_customers: 10,
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            log_file: None,
        }
    }
}

/// Complete config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    pub barber_shop: ShopParams,
    pub logging: LoggingConfig,
}

impl ShopConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded shop config");
        Ok(config)
    }

    /// Parse and validate config JSON
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ShopConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.barber_shop.validate_strict()?;
        self.logging.level()?;
        Ok(())
    }
}
