//! # Error Types
//!
//! Custom error types for ISS Weather Link using `thiserror`.
//!
//! Frame-level rejections live in [`crate::iss::decoder::DecodeError`]; this
//! module covers configuration and transport failures.

use std::time::Duration;
use thiserror::Error;

/// Main error type for ISS Weather Link
#[derive(Debug, Error)]
pub enum WeatherLinkError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors (open, read, flush)
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate device paths could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// No complete frame arrived within the read timeout
    #[error("Timed out after {0:?} waiting for a packet")]
    ReadTimeout(Duration),

    /// The byte source closed mid-frame
    #[error("Byte source closed after {0} of 8 bytes")]
    ShortRead(usize),
}

/// Result type alias for ISS Weather Link
pub type Result<T> = std::result::Result<T, WeatherLinkError>;
