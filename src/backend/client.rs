//! Portfolio Server Client
//!
//! reqwest-based implementation of [`Backend`] for the portfolio web server.

use crate::backend::error::BackendError;
use crate::backend::{Backend, Query};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use std::time::Duration;

// Build timestamp in milliseconds since epoch
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP", "Build timestamp not available");

// User-Agent string with client version
const USER_AGENT: &str = concat!("portfolio-view/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    server_url: String,
    session_cookie: Option<String>,
}

impl BackendClient {
    pub fn new(
        server_url: &str,
        session_cookie: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = ClientBuilder::new()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            server_url: server_url.to_string(),
            session_cookie,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/json")
            .header("X-Client-Build", BUILD_TIMESTAMP);
        match &self.session_cookie {
            Some(cookie) => request.header("Cookie", cookie),
            None => request,
        }
    }

    async fn handle_response_status(response: Response) -> Result<Response, BackendError> {
        if !response.status().is_success() {
            return Err(BackendError::from_response(response).await);
        }
        Ok(response)
    }

    async fn read_body(response: Response) -> Result<Vec<u8>, BackendError> {
        let response = Self::handle_response_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl Backend for BackendClient {
    async fn get(&self, path: &str, query: &Query) -> Result<Vec<u8>, BackendError> {
        let url = self.build_url(path);
        log::debug!("GET {} {:?}", url, query);
        let response = self
            .with_headers(self.client.get(&url))
            .query(query)
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        idempotency_key: &str,
    ) -> Result<Vec<u8>, BackendError> {
        let url = self.build_url(path);
        log::debug!("POST {} (key {})", url, idempotency_key);
        let response = self
            .with_headers(self.client.post(&url))
            .header("Idempotency-Key", idempotency_key)
            .json(&body)
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn delete(&self, path: &str, idempotency_key: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.build_url(path);
        log::debug!("DELETE {} (key {})", url, idempotency_key);
        let response = self
            .with_headers(self.client.delete(&url))
            .header("Idempotency-Key", idempotency_key)
            .send()
            .await?;
        Self::read_body(response).await
    }
}

#[cfg(test)]
/// These are ignored by default since they require a running portfolio server.
mod live_server_tests {
    use super::*;
    use crate::environment::Environment;

    fn local_client() -> BackendClient {
        BackendClient::new(
            &Environment::Local.server_url(),
            std::env::var("PORTFOLIO_SESSION_COOKIE").ok(),
            Duration::from_secs(10),
        )
        .expect("client builds")
    }

    #[tokio::test]
    #[ignore] // This test requires a live portfolio server.
    /// Should fetch the forecasts document for the logged-in user.
    async fn test_get_forecasts() {
        let client = local_client();
        match client.get("portfolio/forecasts", &[]).await {
            Ok(body) => println!("Got {} bytes", body.len()),
            Err(e) => panic!("Failed to fetch forecasts: {}", e),
        }
    }

    #[tokio::test]
    #[ignore] // This test requires a live portfolio server.
    /// Should look up the holding for a symbol.
    async fn test_get_holding() {
        let client = local_client();
        let query = [("symbol".to_string(), "AAPL".to_string())];
        match client.get("portfolio/holdings", &query).await {
            Ok(body) => println!("{}", String::from_utf8_lossy(&body)),
            Err(e) => panic!("Failed to look up holding: {}", e),
        }
    }
}
