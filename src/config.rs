//! Configuration management for the RCE sensor
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{RceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PSE CSV endpoint configuration
    pub source: SourceConfig,

    /// Sensor identity and unit configuration
    pub sensor: SensorConfig,

    /// Refresh cadence configuration
    pub refresh: RefreshConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,

    /// IANA timezone used for wall-clock decisions
    pub timezone: String,
}

/// PSE CSV endpoint parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the operator site
    pub base_url: String,

    /// HTTP read timeout in seconds
    pub timeout_secs: u64,
}

/// Sensor identity and units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Display name of the entity
    pub name: String,

    /// Stable unique identifier
    pub unique_id: String,

    /// Entity icon
    pub icon: String,

    /// Price currency
    pub currency: String,

    /// Price denominator unit (energy amount)
    pub price_type: String,
}

/// Refresh cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Interval between update ticks in seconds
    pub scan_interval_secs: u64,

    /// Local hour after which missing next-day data triggers refetching.
    /// PSE typically publishes next-day prices around midday.
    pub tomorrow_cutoff_hour: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file
    pub file: String,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.pse.pl".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            name: "Rynkowa Cena Energii Elektrycznej".to_string(),
            unique_id: "rce_pse_pln".to_string(),
            icon: "mdi:currency-eur".to_string(),
            currency: "PLN".to_string(),
            price_type: "MWh".to_string(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 1800,
            tomorrow_cutoff_hour: 14,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/rce_sensor.log".to_string(),
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            sensor: SensorConfig::default(),
            refresh: RefreshConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            timezone: "Europe/Warsaw".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "rce_config.yaml",
            "/data/rce_config.yaml",
            "/etc/rce/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse the configured timezone
    pub fn tz(&self) -> Result<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(&self.timezone)
            .map_err(|_| RceError::validation("timezone", &format!("unknown timezone: {}", self.timezone)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.is_empty() {
            return Err(RceError::validation(
                "source.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.source.timeout_secs == 0 {
            return Err(RceError::validation(
                "source.timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.refresh.scan_interval_secs == 0 {
            return Err(RceError::validation(
                "refresh.scan_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.refresh.tomorrow_cutoff_hour > 23 {
            return Err(RceError::validation(
                "refresh.tomorrow_cutoff_hour",
                "Must be an hour of day (0-23)",
            ));
        }

        if self.sensor.unique_id.is_empty() {
            return Err(RceError::validation(
                "sensor.unique_id",
                "Unique id cannot be empty",
            ));
        }

        self.tz()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.source.base_url, "https://www.pse.pl");
        assert_eq!(config.refresh.tomorrow_cutoff_hour, 14);
        assert_eq!(config.sensor.currency, "PLN");
        assert_eq!(config.timezone, "Europe/Warsaw");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Empty base URL
        config.source.base_url = String::new();
        assert!(config.validate().is_err());

        // Reset and test invalid cutoff hour
        config = Config::default();
        config.refresh.tomorrow_cutoff_hour = 24;
        assert!(config.validate().is_err());

        // Unknown timezone
        config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.sensor.unique_id, deserialized.sensor.unique_id);
        assert_eq!(config.web.port, deserialized.web.port);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "timezone: Europe/Berlin\nrefresh:\n  tomorrow_cutoff_hour: 15\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timezone, "Europe/Berlin");
        assert_eq!(config.refresh.tomorrow_cutoff_hour, 15);
        assert_eq!(config.refresh.scan_interval_secs, 1800);
        assert_eq!(config.source.base_url, "https://www.pse.pl");
    }
}
