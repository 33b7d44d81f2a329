//! # Error Types
//!
//! Custom error types for S.Port Telemetry using `thiserror`.
//!
//! These cover startup and I/O paths only. Protocol-level failures inside the
//! bus pump are modelled by [`crate::msp::protocol::MspError`] and never leave
//! the pump.

use thiserror::Error;

/// Main error type for S.Port Telemetry
#[derive(Debug, Error)]
pub enum SportError {
    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// VTX table or settings file errors
    #[error("VTX data error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for S.Port Telemetry
pub type Result<T> = std::result::Result<T, SportError>;
