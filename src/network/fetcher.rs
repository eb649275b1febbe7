//! Resource Fetcher
//!
//! Turns backend calls into uniform outcomes: reads become a [`FetchResult`]
//! and writes an [`Ack`] or a [`SubmitError`]. Nothing here touches section
//! or widget state, and no error escapes as a panic.

use crate::backend::Backend;
use crate::backend::error::{BackendError, server_message};
use crate::network::endpoint::{Endpoint, HttpMethod, Params};
use crate::network::error_handler::ErrorHandler;
use crate::portfolio::{Action, ValidationError};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// One unit of domain data with the key used for widget identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub key: String,
    pub payload: Value,
}

impl Item {
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    /// The request did not complete. `ambiguous` is set when it may still
    /// have been applied by the server.
    #[error("Network error: {message}")]
    Network { message: String, ambiguous: bool },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    /// A 2xx write answer that reports `success: false`.
    #[error("Rejected by server: {0}")]
    Rejected(String),
}

impl From<BackendError> for FailureReason {
    fn from(error: BackendError) -> Self {
        let ambiguous = error.may_have_reached_server();
        match error {
            BackendError::Transport { message, .. } => FailureReason::Network { message, ambiguous },
            BackendError::Http { status, message } => FailureReason::HttpStatus { status, message },
        }
    }
}

/// Outcome of a read. Never partially populated.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Ok(Vec<Item>),
    Empty,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Failed(FailureReason),
}

impl SubmitError {
    /// The write may or may not have been applied.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            SubmitError::Failed(FailureReason::Network {
                ambiguous: true,
                ..
            })
        )
    }
}

/// Acknowledgement of a write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ack {
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct ResourceFetcher {
    backend: Arc<dyn Backend>,
    error_handler: ErrorHandler,
}

impl ResourceFetcher {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            error_handler: ErrorHandler::new(),
        }
    }

    /// Reads `endpoint` and extracts its collection.
    ///
    /// A 2xx answer without the collection field, or with an empty one, is
    /// [`FetchResult::Empty`].
    pub async fn fetch(&self, endpoint: &Endpoint, params: &Params) -> FetchResult {
        let bytes = match self.send(endpoint, endpoint.path, params).await {
            Ok(bytes) => bytes,
            Err(error) => return FetchResult::Failed(error.into()),
        };
        let body = match decode_body(&bytes) {
            Ok(body) => body,
            Err(reason) => return FetchResult::Failed(reason),
        };

        match endpoint.collection {
            Some(collection) => match collection.extract(&body) {
                Ok(Some(items)) => FetchResult::Ok(items),
                Ok(None) => FetchResult::Empty,
                Err(message) => FetchResult::Failed(FailureReason::Decode(message)),
            },
            None if is_blank(&body) => FetchResult::Empty,
            None => FetchResult::Ok(vec![Item::new(endpoint.name, body)]),
        }
    }

    /// Reads a single JSON document.
    pub async fn lookup(&self, endpoint: &Endpoint, params: &Params) -> Result<Value, FailureReason> {
        let bytes = self.send(endpoint, endpoint.path, params).await?;
        decode_body(&bytes)
    }

    /// Validates and sends a write. Invalid actions never reach the network.
    ///
    /// Each call carries a fresh idempotency key. Failed writes are not retried.
    pub async fn submit(&self, action: &Action) -> Result<Ack, SubmitError> {
        let request = action.to_request()?;
        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let result = match request.endpoint.method {
            HttpMethod::Delete => self.backend.delete(&request.path, &idempotency_key).await,
            HttpMethod::Post => {
                let body = request.body.unwrap_or_else(|| Value::Object(Map::new()));
                self.backend
                    .post(&request.path, body, &idempotency_key)
                    .await
            }
            HttpMethod::Get => self.backend.get(&request.path, &[]).await,
        };

        match result {
            Ok(bytes) => parse_ack(&bytes).map_err(SubmitError::Failed),
            Err(error) => {
                let level = self.error_handler.classify_error(&error);
                log::log!(
                    log::Level::from(level),
                    "{} failed ({}): {}",
                    action.describe(),
                    if self.error_handler.is_ambiguous_write(&error) {
                        "outcome unknown"
                    } else {
                        "not applied"
                    },
                    self.error_handler.describe(&error)
                );
                Err(SubmitError::Failed(error.into()))
            }
        }
    }

    async fn send(
        &self,
        endpoint: &Endpoint,
        path: &str,
        params: &Params,
    ) -> Result<Vec<u8>, BackendError> {
        let result = match endpoint.method {
            HttpMethod::Get => self.backend.get(path, params).await,
            HttpMethod::Post => {
                let body: Map<String, Value> = params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                let key = uuid::Uuid::new_v4().to_string();
                self.backend.post(path, Value::Object(body), &key).await
            }
            HttpMethod::Delete => {
                let key = uuid::Uuid::new_v4().to_string();
                self.backend.delete(path, &key).await
            }
        };
        if let Err(error) = &result {
            log::log!(
                log::Level::from(self.error_handler.classify_error(error)),
                "{} {}: {}",
                endpoint.method,
                endpoint.name,
                error
            );
        }
        result
    }
}

fn is_blank(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

/// Decodes a JSON body, reading bare `NaN`/`Infinity` tokens as `null`.
pub(crate) fn decode_body(bytes: &[u8]) -> Result<Value, FailureReason> {
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(error) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| FailureReason::Decode("response is not UTF-8".to_string()))?;
            if !(text.contains("NaN") || text.contains("Infinity")) {
                return Err(FailureReason::Decode(error.to_string()));
            }
            serde_json::from_str(&null_non_finite_tokens(text))
                .map_err(|_| FailureReason::Decode(error.to_string()))
        }
    }
}

fn null_non_finite_tokens(text: &str) -> String {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = rest.chars().next() {
        if !in_string {
            if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
                out.push_str("null");
                rest = &rest[token.len()..];
                continue;
            }
            in_string = c == '"';
        } else if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_string = false;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn parse_ack(bytes: &[u8]) -> Result<Ack, FailureReason> {
    // Some writes answer with an empty 2xx body.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Ack::default());
    }
    let body = decode_body(bytes)?;
    let message = std::str::from_utf8(bytes).ok().and_then(server_message);
    let succeeded = ["success", "ok"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_bool))
        .unwrap_or(true);
    if succeeded {
        Ok(Ack { message })
    } else {
        Err(FailureReason::Rejected(
            message.unwrap_or_else(|| "request was not applied".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::backend::error::TransportKind;
    use crate::network::endpoints;
    use crate::portfolio::TradeOrder;
    use serde_json::json;

    fn fetcher(mock: MockBackend) -> ResourceFetcher {
        ResourceFetcher::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_empty_forecasts_are_empty_not_failed() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .returning(|_, _| Ok(br#"{"forecasts": {}}"#.to_vec()));
        let result = fetcher(mock).fetch(&endpoints::FORECASTS, &vec![]).await;
        assert_eq!(result, FetchResult::Empty);
    }

    #[tokio::test]
    async fn test_server_error_is_http_status_failure() {
        let mut mock = MockBackend::new();
        mock.expect_get().returning(|_, _| {
            Err(BackendError::Http {
                status: 500,
                message: "Failed to analyze risk".to_string(),
            })
        });
        let result = fetcher(mock).fetch(&endpoints::RISK_ANALYSIS, &vec![]).await;
        assert_eq!(
            result,
            FetchResult::Failed(FailureReason::HttpStatus {
                status: 500,
                message: "Failed to analyze risk".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_failure() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .returning(|_, _| Ok(b"<html>gateway</html>".to_vec()));
        let result = fetcher(mock).fetch(&endpoints::NEWS, &vec![]).await;
        assert!(matches!(result, FetchResult::Failed(FailureReason::Decode(_))));
    }

    #[tokio::test]
    async fn test_query_params_are_passed_through() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .withf(|path, query| {
                path.to_string() == "portfolio/holdings"
                    && query.to_vec() == vec![("symbol".to_string(), "AAPL".to_string())]
            })
            .times(1)
            .returning(|_, _| Ok(br#"{"holding": {"quantity": 4}}"#.to_vec()));
        let params = vec![("symbol".to_string(), "AAPL".to_string())];
        let value = fetcher(mock)
            .lookup(&endpoints::HOLDINGS, &params)
            .await
            .unwrap();
        assert_eq!(value, json!({"holding": {"quantity": 4}}));
    }

    #[test]
    fn test_bare_non_finite_numbers_decode_as_null() {
        let body = br#"{"volatility": NaN, "beta": -Infinity, "note": "NaN stays"}"#;
        assert_eq!(
            decode_body(body).unwrap(),
            json!({"volatility": null, "beta": null, "note": "NaN stays"})
        );
    }

    #[tokio::test]
    async fn test_invalid_write_never_reaches_the_network() {
        let mut mock = MockBackend::new();
        mock.expect_post().times(0);
        let action = Action::Buy(TradeOrder::new("AAPL", 0.0009));
        let result = fetcher(mock).submit(&action).await;
        assert!(matches!(
            result,
            Err(SubmitError::Invalid(ValidationError::QuantityTooSmall { .. }))
        ));
    }

    #[tokio::test]
    async fn test_valid_write_is_sent_once_with_an_idempotency_key() {
        let mut mock = MockBackend::new();
        mock.expect_post()
            .withf(|path, body, key| {
                path.to_string() == "portfolio/add_stock"
                    && body["quantity"] == json!(0.001)
                    && uuid::Uuid::parse_str(key).is_ok()
            })
            .times(1)
            .returning(|_, _, _| Ok(br#"{"success": true}"#.to_vec()));
        let action = Action::Buy(TradeOrder::new("AAPL", 0.001));
        assert_eq!(fetcher(mock).submit(&action).await, Ok(Ack::default()));
    }

    #[tokio::test]
    async fn test_timed_out_write_is_ambiguous() {
        let mut mock = MockBackend::new();
        mock.expect_post().times(1).returning(|_, _, _| {
            Err(BackendError::Transport {
                kind: TransportKind::Timeout,
                message: "timed out".to_string(),
            })
        });
        let action = Action::Sell(TradeOrder::new("AAPL", 1.0));
        let error = fetcher(mock).submit(&action).await.unwrap_err();
        assert!(error.is_ambiguous());
    }

    #[test]
    fn test_success_false_is_a_rejection() {
        assert_eq!(
            parse_ack(br#"{"success": false, "message": "Not enough shares"}"#),
            Err(FailureReason::Rejected("Not enough shares".to_string()))
        );
        assert_eq!(
            parse_ack(br#"{"success": true, "message": "Preferences saved"}"#),
            Ok(Ack {
                message: Some("Preferences saved".to_string())
            })
        );
        assert_eq!(parse_ack(b""), Ok(Ack::default()));
    }
}
