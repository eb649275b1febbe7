use crate::backend::error::BackendError;

pub(crate) mod client;
pub use client::BackendClient;
pub mod error;

#[cfg(test)]
use mockall::automock;

/// Flat query string parameters, in the order they are sent.
pub type Query = [(String, String)];

/// Raw HTTP access to the portfolio server. Paths are relative to the server root.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// GET `path?query`, returning the body of a 2xx response.
    async fn get(&self, path: &str, query: &Query) -> Result<Vec<u8>, BackendError>;

    /// POST a JSON body. Writes carry an idempotency key so the server can drop replays.
    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        idempotency_key: &str,
    ) -> Result<Vec<u8>, BackendError>;

    /// DELETE `path`.
    async fn delete(&self, path: &str, idempotency_key: &str) -> Result<Vec<u8>, BackendError>;
}
