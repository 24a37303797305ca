//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TelemetryError};
use crate::telemetry::window::DurationLabel;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub radio: RadioConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub region: Option<RegionConfig>,

    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

/// LoRa modem configuration, sent once after the port opens
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_radio_enabled")]
    pub enabled: bool,

    #[serde(default = "default_rf_power_dbm")]
    pub rf_power_dbm: u8,

    #[serde(default = "default_address")]
    pub address: u16,

    #[serde(default = "default_network_id")]
    pub network_id: u8,

    #[serde(default = "default_spreading_factor")]
    pub spreading_factor: u8,

    #[serde(default = "default_bandwidth")]
    pub bandwidth: u8,

    #[serde(default = "default_coding_rate")]
    pub coding_rate: u8,

    #[serde(default = "default_preamble")]
    pub preamble: u8,
}

/// Ingestion configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_expected_packet_delay_ms")]
    pub expected_packet_delay_ms: u64,

    #[serde(default = "default_retention_s")]
    pub retention_s: u64,
}

/// Where raw lines come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Serial,
    Replay,
    Simulator,
}

/// Line source configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    #[serde(default)]
    pub replay_file: Option<PathBuf>,

    #[serde(default = "default_replay_looped")]
    pub replay_looped: bool,

    #[serde(default = "default_source_interval_ms")]
    pub interval_ms: u64,
}

/// Display refresh configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    #[serde(default)]
    pub layout_file: Option<PathBuf>,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

/// Named geographic region the vehicle is expected to stay within
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RegionConfig {
    pub name: String,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// One chart: the fields it plots and how far back it looks
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChartConfig {
    pub fields: Vec<String>,

    #[serde(default)]
    pub window: DurationLabel,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_reconnect_interval_ms() -> u64 { 1000 }
fn default_max_reconnect_attempts() -> u32 { 5 }

fn default_radio_enabled() -> bool { true }
fn default_rf_power_dbm() -> u8 { 15 }
fn default_address() -> u16 { 2 }
fn default_network_id() -> u8 { 18 }
fn default_spreading_factor() -> u8 { 9 }
fn default_bandwidth() -> u8 { 7 }
fn default_coding_rate() -> u8 { 1 }
fn default_preamble() -> u8 { 12 }

fn default_expected_packet_delay_ms() -> u64 { 200 }
fn default_retention_s() -> u64 { 3600 }

fn default_source_kind() -> SourceKind { SourceKind::Serial }
fn default_replay_looped() -> bool { false }
fn default_source_interval_ms() -> u64 { 200 }

fn default_refresh_ms() -> u64 { 200 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            enabled: default_radio_enabled(),
            rf_power_dbm: default_rf_power_dbm(),
            address: default_address(),
            network_id: default_network_id(),
            spreading_factor: default_spreading_factor(),
            bandwidth: default_bandwidth(),
            coding_rate: default_coding_rate(),
            preamble: default_preamble(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            expected_packet_delay_ms: default_expected_packet_delay_ms(),
            retention_s: default_retention_s(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            replay_file: None,
            replay_looped: default_replay_looped(),
            interval_ms: default_source_interval_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_ms: default_refresh_ms(),
            layout_file: None,
        }
    }
}

impl RegionConfig {
    /// True if a decimal-degree position lies inside the region
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

fn invalid(msg: impl std::fmt::Display) -> TelemetryError {
    TelemetryError::Config(toml::de::Error::custom(msg))
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
    /// use telemetry_dash::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate serial port configuration
        if self.source.kind == SourceKind::Serial && self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60000 {
            return Err(invalid("reconnect_interval_ms must be between 1 and 60000"));
        }

        // Validate radio parameters (REYAX RYLR8xx ranges)
        if self.radio.rf_power_dbm > 22 {
            return Err(invalid("rf_power_dbm must be between 0 and 22"));
        }

        let network_id = self.radio.network_id;
        if !((3..=15).contains(&network_id) || network_id == 18) {
            return Err(invalid("network_id must be between 3 and 15, or 18"));
        }

        if !(5..=11).contains(&self.radio.spreading_factor) {
            return Err(invalid("spreading_factor must be between 5 and 11"));
        }

        if self.radio.bandwidth > 9 {
            return Err(invalid("bandwidth must be between 0 and 9"));
        }

        if !(1..=4).contains(&self.radio.coding_rate) {
            return Err(invalid("coding_rate must be between 1 and 4"));
        }

        if !(4..=25).contains(&self.radio.preamble) {
            return Err(invalid("preamble must be between 4 and 25"));
        }

        // Validate timing fields
        if self.telemetry.expected_packet_delay_ms == 0 || self.telemetry.expected_packet_delay_ms > 60000 {
            return Err(invalid("expected_packet_delay_ms must be between 1 and 60000"));
        }

        if self.telemetry.retention_s == 0 {
            return Err(invalid("retention_s must be greater than 0"));
        }

        if self.telemetry.retention_s.saturating_mul(1000) < self.telemetry.expected_packet_delay_ms {
            return Err(invalid("retention_s must cover at least one packet"));
        }

        if self.display.refresh_ms == 0 || self.display.refresh_ms > 60000 {
            return Err(invalid("refresh_ms must be between 1 and 60000"));
        }

        // Validate source selection
        if self.source.kind == SourceKind::Replay && self.source.replay_file.is_none() {
            return Err(invalid("replay_file is required when source kind is 'replay'"));
        }

        if self.source.interval_ms == 0 || self.source.interval_ms > 60000 {
            return Err(invalid("source interval_ms must be between 1 and 60000"));
        }

        // Validate charts
        for (i, chart) in self.charts.iter().enumerate() {
            if chart.fields.iter().any(|f| f.is_empty()) {
                return Err(invalid(format!("chart {} has an empty field name", i)));
            }
        }

        // Validate region bounds
        if let Some(region) = &self.region {
            if region.name.is_empty() {
                return Err(invalid("region name cannot be empty"));
            }
            if region.min_lat >= region.max_lat || region.min_lon >= region.max_lon {
                return Err(invalid("region min bounds must be below max bounds"));
            }
            if region.min_lat < -90.0 || region.max_lat > 90.0 {
                return Err(invalid("region latitude must be between -90 and 90"));
            }
            if region.min_lon < -180.0 || region.max_lon > 180.0 {
                return Err(invalid("region longitude must be between -180 and 180"));
            }
        }

        Ok(())
    }
}
