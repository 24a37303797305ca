//! # Error Types
//!
//! Custom error types for Telemetry Dash using `thiserror`.

use thiserror::Error;

/// Main error type for Telemetry Dash
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Chart layout document errors
    #[error("Layout error: {0}")]
    Layout(#[from] serde_json::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Radio modem handshake errors
    #[error("Modem error: {0}")]
    Modem(String),

    /// Line source errors (replay file, simulator)
    #[error("Source error: {0}")]
    Source(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Telemetry Dash
pub type Result<T> = std::result::Result<T, TelemetryError>;
