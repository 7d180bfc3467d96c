//! CLI Exit Codes
//!
//! Exit codes reported by `sensorlink-cli`, stable for scripting.

use crate::core::controller::ControllerError;
use crate::core::events::{AttemptFailure, StatusOutcome};
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments or configuration
    pub const INVALID_ARGS: u8 = 2;

    /// Serial device could not be opened
    pub const CONNECTION_FAILED: u8 = 3;

    /// No identity reply within the wait period
    pub const TIMEOUT: u8 = 4;

    /// No serial ports found
    pub const PORT_NOT_FOUND: u8 = 5;

    /// Another link holds the connection
    pub const DEVICE_BUSY: u8 = 6;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success carrying a message
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Map an attempt outcome
    pub fn from_outcome(port: &str, outcome: &StatusOutcome) -> Self {
        match outcome {
            StatusOutcome::Success => Self::success_with_message(format!("Connected to {port}")),
            StatusOutcome::Failure(AttemptFailure::Busy) => {
                Self::error(ExitCodes::DEVICE_BUSY, format!("{port}: another link is connected"))
            }
            StatusOutcome::Failure(AttemptFailure::InvalidPort) => {
                Self::error(ExitCodes::INVALID_ARGS, "Empty port name")
            }
            StatusOutcome::Failure(AttemptFailure::LinkOpen(reason)) => {
                Self::error(ExitCodes::CONNECTION_FAILED, reason.clone())
            }
        }
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) | Self::Error(_, msg) => Some(msg),
            Self::Success(None) => None,
        }
    }

    /// Convert to `ExitCode`
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<ControllerError> for CliResult {
    fn from(err: ControllerError) -> Self {
        let code = match err {
            ControllerError::NoPorts => ExitCodes::PORT_NOT_FOUND,
            ControllerError::Link(_) | ControllerError::Executor(_) => ExitCodes::ERROR,
        };
        Self::Error(code, err.to_string())
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Handshake timeout",
        5 => "Port not found",
        6 => "Device busy",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_result() {
        let success = CliResult::success();
        assert!(success.is_success());
        assert_eq!(success.code(), 0);

        let error = CliResult::error(3, "Connection failed");
        assert!(!error.is_success());
        assert_eq!(error.code(), 3);
        assert_eq!(error.message(), Some("Connection failed"));
    }

    #[test]
    fn test_from_outcome() {
        let busy = CliResult::from_outcome("COM3", &StatusOutcome::Failure(AttemptFailure::Busy));
        assert_eq!(busy.code(), ExitCodes::DEVICE_BUSY);

        let open = CliResult::from_outcome(
            "COM3",
            &StatusOutcome::Failure(AttemptFailure::LinkOpen("Port not found: COM3".to_string())),
        );
        assert_eq!(open.code(), ExitCodes::CONNECTION_FAILED);
        assert_eq!(exit_code_description(open.code()), "Connection failed");
    }

    #[test]
    fn test_from_controller_error() {
        let result = CliResult::from(ControllerError::NoPorts);
        assert_eq!(result.code(), ExitCodes::PORT_NOT_FOUND);
        assert_eq!(result.message(), Some("No serial ports available"));
    }
}
