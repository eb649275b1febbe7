//! Error handling for the backend module

use thiserror::Error;

/// How far a failed request got before the transport gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// The connection was never established; the server saw nothing.
    Connect,
    /// The request was sent but no complete response arrived in time.
    Timeout,
    /// Any other transport failure (reset, body read, TLS).
    Other,
}

#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport failure, typically network issues or timeouts.
    #[error("Network error ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP error with status {status}: {message}")]
    Http { status: u16, message: String },
}

impl BackendError {
    pub async fn from_response(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response text".to_string());

        BackendError::Http {
            status,
            message: server_message(&text).unwrap_or(text),
        }
    }

    /// Whether the server may have applied a write even though the call failed.
    pub fn may_have_reached_server(&self) -> bool {
        matches!(
            self,
            BackendError::Transport {
                kind: TransportKind::Timeout | TransportKind::Other,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_connect() {
            TransportKind::Connect
        } else if error.is_timeout() {
            TransportKind::Timeout
        } else {
            TransportKind::Other
        };
        BackendError::Transport {
            kind,
            message: error.to_string(),
        }
    }
}

/// Extracts the human readable part of a JSON error body (`{"error": ..}` or `{"message": ..}`).
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|field| value.get(*field)?.as_str().map(str::to_string))
}
