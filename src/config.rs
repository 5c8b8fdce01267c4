//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, WeatherLinkError};
use crate::link::LinkHealthConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub station: StationConfig,
    pub link: LinkConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Transmitter configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    /// Transmitter id set on the ISS DIP switches (1-8)
    #[serde(default = "default_station_id")]
    pub id: u8,

    #[serde(default = "default_wind_direction_samples")]
    pub wind_direction_samples: usize,
}

/// Link health configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    #[serde(default = "default_recovery_cooldown_s")]
    pub recovery_cooldown_s: u64,

    /// Settle time after reopening the port
    #[serde(default = "default_flush_delay_ms")]
    pub flush_delay_ms: u64,

    #[serde(default = "default_persistent_after_recoveries")]
    pub persistent_after_recoveries: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_stats_interval_s")]
    pub stats_interval_s: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily log files; empty logs to stdout only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/serial0".to_string() }
fn default_baud_rate() -> u32 { 4800 }
fn default_timeout_ms() -> u64 { 3000 }

fn default_station_id() -> u8 { 1 }
fn default_wind_direction_samples() -> usize { 20 }

fn default_failure_threshold() -> u32 { 12 }
fn default_recovery_cooldown_s() -> u64 { 60 }
fn default_flush_delay_ms() -> u64 { 100 }
fn default_persistent_after_recoveries() -> u32 { 3 }

fn default_stats_interval_s() -> u64 { 3600 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            id: default_station_id(),
            wind_direction_samples: default_wind_direction_samples(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_cooldown_s: default_recovery_cooldown_s(),
            flush_delay_ms: default_flush_delay_ms(),
            persistent_after_recoveries: default_persistent_after_recoveries(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            stats_interval_s: default_stats_interval_s(),
        }
    }
}

/// Supported relay baud rates
const VALID_BAUD_RATES: [u32; 7] = [2400, 4800, 9600, 19200, 38400, 57600, 115200];

fn invalid(message: impl std::fmt::Display) -> WeatherLinkError {
    WeatherLinkError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use iss_weather_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, built-in defaults otherwise
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be parsed or validated
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Validate serial port configuration
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 2400, 4800, 9600, 19200, 38400, 57600, 115200",
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Validate station
        if !(1..=8).contains(&self.station.id) {
            return Err(invalid(format!("station id {} is out of range (must be 1-8)", self.station.id)));
        }

        if self.station.wind_direction_samples == 0 || self.station.wind_direction_samples > 360 {
            return Err(invalid("wind_direction_samples must be between 1 and 360"));
        }

        // Validate link health settings
        if self.link.failure_threshold == 0 {
            return Err(invalid("failure_threshold must be greater than 0"));
        }

        if self.link.recovery_cooldown_s == 0 {
            return Err(invalid("recovery_cooldown_s must be greater than 0"));
        }

        if self.link.flush_delay_ms == 0 || self.link.flush_delay_ms > 5000 {
            return Err(invalid("flush_delay_ms must be between 1 and 5000"));
        }

        if self.link.persistent_after_recoveries == 0 {
            return Err(invalid("persistent_after_recoveries must be greater than 0"));
        }

        if self.telemetry.stats_interval_s == 0 || self.telemetry.stats_interval_s > 86400 {
            return Err(invalid("stats_interval_s must be between 1 and 86400"));
        }

        Ok(())
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LinkConfig {
    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }

    /// Thresholds for [`crate::link::LinkHealthMonitor`]
    pub fn health_config(&self) -> LinkHealthConfig {
        LinkHealthConfig {
            failure_threshold: self.failure_threshold,
            recovery_cooldown: Duration::from_secs(self.recovery_cooldown_s),
            persistent_after_recoveries: self.persistent_after_recoveries,
        }
    }
}

impl TelemetryConfig {
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_s)
    }
}
