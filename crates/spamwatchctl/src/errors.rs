//! Error messages and exit status for spamwatchctl

use reqwest::StatusCode;
use spamwatch_common::schemas::ErrorBody;
use std::fmt;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the request was rejected as invalid
pub const EXIT_INVALID_INPUT: i32 = 65;

/// Exit code when the daemon is unreachable or has no model
pub const EXIT_DAEMON_UNAVAILABLE: i32 = 70;

/// Failure talking to the daemon, already phrased for the user
#[derive(Debug)]
pub struct ClientError {
    pub message: String,
    pub exit_code: i32,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    /// Translate an error response from the daemon.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail.first_message().map(str::to_string));

        let (message, exit_code) = match status.as_u16() {
            400 => (
                detail.unwrap_or_else(|| "Invalid input. Please check your message.".to_string()),
                EXIT_INVALID_INPUT,
            ),
            422 => (
                detail.unwrap_or_else(|| "Validation error. Check message format.".to_string()),
                EXIT_INVALID_INPUT,
            ),
            503 => (
                "Model is loading. Please wait and try again.".to_string(),
                EXIT_DAEMON_UNAVAILABLE,
            ),
            500 => (
                "Server error. Please try again later.".to_string(),
                EXIT_GENERAL_ERROR,
            ),
            code => (
                format!(
                    "Error {}: {}",
                    code,
                    detail.unwrap_or_else(|| "Unknown error occurred".to_string())
                ),
                EXIT_GENERAL_ERROR,
            ),
        };
        Self { message, exit_code }
    }

    /// The daemon could not be reached at all.
    pub fn unreachable(base_url: &str) -> Self {
        Self {
            message: format!("Cannot reach server at {}. Is spamwatchd running?", base_url),
            exit_code: EXIT_DAEMON_UNAVAILABLE,
        }
    }
}
