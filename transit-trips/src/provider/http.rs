//! Shared HTTP transport for providers.
//!
//! Handles authentication headers, a concurrency limit and status-code
//! mapping. No retries: every failure is returned to the caller as-is.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::error::ProviderError;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Default header carrying the API key.
const DEFAULT_API_KEY_HEADER: &str = "x-apikey";

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL requests are resolved against
    pub base_url: String,
    /// API key, if the backend needs one
    pub api_key: Option<String>,
    /// Header the API key is sent in
    pub api_key_header: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP client shared by a provider's operations.
///
/// Cheap to clone; clones share the connection pool and concurrency limit.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &config.api_key {
            let name = HeaderName::from_bytes(config.api_key_header.as_bytes()).map_err(|_| {
                ProviderError::Api {
                    status: 0,
                    message: format!("Invalid API key header: {}", config.api_key_header),
                }
            })?;
            let value = HeaderValue::from_str(key).map_err(|_| ProviderError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL.
    ///
    /// An empty path addresses the base URL itself.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url, path)
    }

    /// GET a path and return the body text.
    pub async fn get_text(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, ProviderError> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(request).await
    }

    /// GET a path and parse the body as JSON.
    ///
    /// `context` names the operation in format errors.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let body = self.get_text(path, query).await?;
        parse_json(context, &body)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ProviderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ProviderError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await.inspect_err(|e| {
            warn!(error = %e, "transport failure");
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "backend response");

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

/// Parse a backend body, wrapping failures with context and a body excerpt.
pub(crate) fn parse_json<T: DeserializeOwned>(context: &str, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::format(context, e, Some(body)))
}
