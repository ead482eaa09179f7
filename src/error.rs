//! Error types and result definitions for the tuya-climate crate.
//! Carries Tuya-style numeric error codes so hosts can report failures uniformly.

use thiserror::Error;

/// Represents all possible errors raised while talking to a thermostat.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClimateError {
    /// Standard IO error (network, socket, etc.)
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization or deserialization error
    #[error("JSON error: {0}")]
    Json(String),

    /// The status payload was malformed or lacked a data point object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Request timed out
    #[error("Timeout waiting for device")]
    Timeout,

    /// TCP connection could not be established
    #[error("Socket connection failed")]
    ConnectionFailed,

    /// Device is currently unreachable or disconnected
    #[error("Device offline")]
    Offline,

    /// Wrong local key or protocol version
    #[error("Check device key or version (Error 914)")]
    KeyOrVersionError,

    /// Requested value lies outside what the device accepts
    #[error("Value {value} out of range ({min}..={max})")]
    OutOfRange { value: f32, min: f32, max: f32 },

    /// Configuration was rejected during validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for thermostat operations.
pub type Result<T> = std::result::Result<T, ClimateError>;

impl From<std::io::Error> for ClimateError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => ClimateError::Timeout,
            std::io::ErrorKind::ConnectionRefused => ClimateError::ConnectionFailed,
            _ => ClimateError::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ClimateError {
    fn from(err: serde_json::Error) -> Self {
        ClimateError::Json(err.to_string())
    }
}

impl ClimateError {
    pub fn code(&self) -> u32 {
        match self {
            ClimateError::Io(_) => ERR_CONNECT,
            ClimateError::Json(_) => ERR_JSON,
            ClimateError::InvalidPayload(_) => ERR_PAYLOAD,
            ClimateError::Timeout => ERR_TIMEOUT,
            ClimateError::ConnectionFailed => ERR_CONNECT,
            ClimateError::Offline => ERR_OFFLINE,
            ClimateError::KeyOrVersionError => ERR_KEY_OR_VER,
            ClimateError::OutOfRange { .. } => ERR_RANGE,
            ClimateError::InvalidConfig(_) => ERR_CONFIG,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            ERR_JSON => ClimateError::Json("Generic JSON error".to_string()),
            ERR_CONNECT => ClimateError::ConnectionFailed,
            ERR_TIMEOUT => ClimateError::Timeout,
            ERR_OFFLINE => ClimateError::Offline,
            ERR_KEY_OR_VER => ClimateError::KeyOrVersionError,
            ERR_PAYLOAD => ClimateError::InvalidPayload(error_message(code).to_string()),
            ERR_CONFIG => ClimateError::InvalidConfig(error_message(code).to_string()),
            _ => ClimateError::Io(format!("Unknown error code: {}", code)),
        }
    }

    /// Whether the failure came from the link to the device rather than from the caller.
    pub fn is_communication(&self) -> bool {
        !matches!(
            self,
            ClimateError::OutOfRange { .. } | ClimateError::InvalidConfig(_)
        )
    }
}

// TinyTuya-compatible response codes
pub const ERR_SUCCESS: u32 = 0;
pub const ERR_JSON: u32 = 900;
pub const ERR_CONNECT: u32 = 901;
pub const ERR_TIMEOUT: u32 = 902;
pub const ERR_RANGE: u32 = 903;
pub const ERR_PAYLOAD: u32 = 904;
pub const ERR_OFFLINE: u32 = 905;
pub const ERR_KEY_OR_VER: u32 = 914;
pub const ERR_CONFIG: u32 = 916;

pub fn error_message(code: u32) -> &'static str {
    match code {
        ERR_SUCCESS => "Connection Successful",
        ERR_JSON => "Invalid JSON Response from Device",
        ERR_CONNECT => "Network Error: Unable to Connect",
        ERR_TIMEOUT => "Timeout Waiting for Device",
        ERR_RANGE => "Specified Value Out of Range",
        ERR_PAYLOAD => "Unexpected Payload from Device",
        ERR_OFFLINE => "Network Error: Device Unreachable",
        ERR_KEY_OR_VER => "Check device key or version",
        ERR_CONFIG => "Invalid Climate Configuration",
        _ => "Unknown Error",
    }
}
