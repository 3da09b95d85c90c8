//! Transport error types

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },

    #[error("Payload too long: {len} bytes, frame holds {max}")]
    PayloadTooLong { len: usize, max: usize },

    #[error("Short write: {written} of {expected} bytes accepted")]
    ShortWrite { expected: usize, written: usize },

    // HID-specific errors
    #[error("HID error: {0}")]
    HidError(String),

    #[error("HID permission denied: {0}")]
    HidPermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("EPERM") {
            TransportError::HidPermissionDenied(msg)
        } else {
            TransportError::HidError(msg)
        }
    }
}

/// Verdict returned by the frame handler for one inbound frame
///
/// A nonzero device status is reported here as well so that the transport
/// can log bad frames even when nobody is waiting for them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame size mismatch: expected {expected} bytes, got {actual}")]
    Size { expected: usize, actual: usize },

    #[error("Device reported status {status} for command 0x{command:02X}")]
    Status { command: u8, status: u8 },

    #[error("Unhandled reply: command 0x{command:02X}, index 0x{index:02X}")]
    Unhandled { command: u8, index: u8 },
}
