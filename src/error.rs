//! # Error Types
//!
//! Custom error types for SubGHz Link using `thiserror`.

use thiserror::Error;

/// Main error type for SubGHz Link
#[derive(Debug, Error)]
pub enum LinkError {
    /// The radio collaborator reported a non-success status
    #[error("Radio {operation} failed with status {status}")]
    Radio {
        /// Radio operation that failed (e.g. "send", "begin")
        operation: &'static str,
        /// Status code exactly as reported by the radio
        status: u8,
    },

    /// Header carries a reserved type tag (4-7)
    #[error("Unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// A used length beyond the body capacity was requested
    #[error("Length {length} exceeds body capacity {capacity}")]
    LengthOutOfRange { length: usize, capacity: usize },

    /// Received wire bytes do not even hold a header
    #[error("Frame too short: no header byte")]
    FrameTooShort,

    /// Received wire bytes exceed one radio transmission
    #[error("Frame too long: {length} bytes, maximum {capacity}")]
    FrameTooLong { length: usize, capacity: usize },

    /// Serial modem link envelope errors
    #[error("Modem link error: {0}")]
    ModemLink(String),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// The modem did not reply in time
    #[error("Modem {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Capture record serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for SubGHz Link
pub type Result<T> = std::result::Result<T, LinkError>;
