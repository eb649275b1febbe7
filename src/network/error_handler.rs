//! Centralized error handling and classification

use crate::backend::error::{BackendError, TransportKind};
use crate::logging::LogLevel;

/// Centralized error handler for all backend operations
#[derive(Debug, Clone)]
pub struct ErrorHandler;

impl ErrorHandler {
    pub fn new() -> Self {
        Self
    }

    /// Classify error and determine appropriate log level
    pub fn classify_error(&self, error: &BackendError) -> LogLevel {
        match error {
            // Rate limiting - low priority
            BackendError::Http { status, .. } if *status == 429 => LogLevel::Debug,

            // Server errors - temporary issues
            BackendError::Http { status, .. } if (500..=599).contains(status) => LogLevel::Warn,

            // Session expired or not allowed - the user has to act
            BackendError::Http { status, .. } if *status == 401 => LogLevel::Error,
            BackendError::Http { status, .. } if *status == 403 => LogLevel::Error,

            // Network issues - usually temporary
            BackendError::Transport { .. } => LogLevel::Warn,

            // Other errors
            _ => LogLevel::Warn,
        }
    }

    /// A write failed in a way that leaves its outcome unknown.
    ///
    /// Nothing is retried automatically; the caller has to refresh and look.
    pub fn is_ambiguous_write(&self, error: &BackendError) -> bool {
        error.may_have_reached_server()
    }

    /// Short user-facing text for a failed request.
    pub fn describe(&self, error: &BackendError) -> String {
        match error {
            BackendError::Transport {
                kind: TransportKind::Connect,
                ..
            } => "Could not reach the server".to_string(),
            BackendError::Transport {
                kind: TransportKind::Timeout,
                ..
            } => "The server did not answer in time".to_string(),
            BackendError::Transport { message, .. } => format!("Connection failed: {}", message),
            BackendError::Http { status: 401, .. } => {
                "Session expired, log in again and update session_cookie".to_string()
            }
            BackendError::Http { status, message } => format!("HTTP {}: {}", status, message),
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}
