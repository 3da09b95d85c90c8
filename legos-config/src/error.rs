//! Configuration error types

use legos_transport::protocol::cmd;
use legos_transport::TransportError;
use serde::Serialize;
use thiserror::Error;

/// Errors from configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Transport layer or framing error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// No reply arrived within the command timeout
    #[error("Device busy: no reply to {} index 0x{index:02X}", command_name(.command))]
    Busy { command: u8, index: u8 },

    /// The MCU rejected the request
    #[error("Device rejected {} index 0x{index:02X} with status {status}", command_name(.command))]
    Device { command: u8, index: u8, status: u8 },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No such property on the configuration surface
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    /// Device returned unexpected response
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

fn command_name(command: &u8) -> &'static str {
    cmd::name(*command)
}

/// Stable error classes exposed on the configuration surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transport,
    Busy,
    Device,
    Validation,
    Decode,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Busy => "busy",
            Self::Device => "device",
            Self::Validation => "validation",
            Self::Decode => "decode",
        }
    }
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Busy { .. } => ErrorCategory::Busy,
            Self::Device { .. } => ErrorCategory::Device,
            Self::InvalidParameter(_) | Self::UnknownProperty(_) => ErrorCategory::Validation,
            Self::UnexpectedResponse(_) => ErrorCategory::Decode,
        }
    }

    /// Only a timed out wait is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinct() {
        let errors = [
            ConfigError::Transport(TransportError::Disconnected),
            ConfigError::Busy { command: 0x03, index: 0x01 },
            ConfigError::Device { command: 0x04, index: 0x01, status: 1 },
            ConfigError::InvalidParameter("x".into()),
            ConfigError::UnexpectedResponse("y".into()),
        ];
        let categories: Vec<_> = errors.iter().map(ConfigError::category).collect();
        assert_eq!(
            categories,
            vec![
                ErrorCategory::Transport,
                ErrorCategory::Busy,
                ErrorCategory::Device,
                ErrorCategory::Validation,
                ErrorCategory::Decode,
            ]
        );
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(ConfigError::Busy { command: 0, index: 0 }.is_retryable());
        assert!(!ConfigError::Device { command: 0, index: 0, status: 3 }.is_retryable());
        assert!(!ConfigError::InvalidParameter("x".into()).is_retryable());
    }

    #[test]
    fn test_device_error_message_names_command() {
        let err = ConfigError::Device {
            command: cmd::SET_GAMEPAD_CFG,
            index: 0x12,
            status: 2,
        };
        assert_eq!(
            err.to_string(),
            "Device rejected SET_GAMEPAD_CFG index 0x12 with status 2"
        );
    }
}
