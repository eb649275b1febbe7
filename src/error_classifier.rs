use crate::network::FailureReason;
use crate::sync::ItemRenderError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Log level for a section-level fetch failure.
    pub fn classify_fetch_error(&self, reason: &FailureReason) -> LogLevel {
        match reason {
            // Non-critical: rate limiting and temporary server issues
            FailureReason::HttpStatus { status, .. } if *status == 429 => LogLevel::Debug,
            FailureReason::HttpStatus { status, .. } if (500..=599).contains(status) => {
                LogLevel::Warn
            }

            // Critical: session expired or forbidden, malformed responses
            FailureReason::HttpStatus { status, .. } if *status == 401 => LogLevel::Error,
            FailureReason::HttpStatus { status, .. } if *status == 403 => LogLevel::Error,
            FailureReason::Decode(_) => LogLevel::Error,

            // Network issues - usually temporary
            _ => LogLevel::Warn,
        }
    }

    /// Log level for one skipped item. Skips never abort a section, so they stay below error.
    pub fn classify_render_error(&self, error: &ItemRenderError) -> LogLevel {
        match error {
            ItemRenderError::Incomplete { .. } => LogLevel::Debug,
            ItemRenderError::Malformed { .. } => LogLevel::Warn,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_warnings_and_auth_errors_are_errors() {
        let classifier = ErrorClassifier::new();
        let server = FailureReason::HttpStatus {
            status: 503,
            message: "busy".to_string(),
        };
        let auth = FailureReason::HttpStatus {
            status: 401,
            message: "login required".to_string(),
        };
        assert_eq!(classifier.classify_fetch_error(&server), LogLevel::Warn);
        assert_eq!(classifier.classify_fetch_error(&auth), LogLevel::Error);
        assert_eq!(
            classifier.classify_fetch_error(&FailureReason::Decode("eof".to_string())),
            LogLevel::Error
        );
    }
}
