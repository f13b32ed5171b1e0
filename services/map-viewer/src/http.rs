//! HTTP fetching for the viewer's remote data sources.
//!
//! Key features:
//! - Shared reqwest client with connect and request timeouts
//! - Exponential backoff retry for idempotent document fetches
//! - Non-success statuses mapped to per-source data failures

use std::time::Duration;

use floodwatch_common::{FloodwatchError, FloodwatchResult};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Configuration for outgoing HTTP requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Attempts for document fetches (first try included)
    pub max_attempts: u32,
    /// Initial retry delay in milliseconds (doubles each retry)
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_attempts: 3,
            initial_retry_delay_ms: 1000,
            max_retry_delay_ms: 8000,
        }
    }
}

/// Fetches text documents over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: HttpConfig) -> FloodwatchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                FloodwatchError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Single GET returning the body of a successful response.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_text(&self, url: &str) -> FloodwatchResult<String> {
        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FloodwatchError::RequestFailed(format!("HTTP {} from {}", status, url)));
        }

        let body = response.text().await.map_err(request_error)?;
        debug!(bytes = body.len(), "Fetched document");
        Ok(body)
    }

    /// GET with exponential backoff between failed attempts.
    pub async fn get_text_with_retry(&self, url: &str) -> FloodwatchResult<String> {
        let max_attempts = self.config.max_attempts.max(1);
        let max_delay = Duration::from_millis(self.config.max_retry_delay_ms);
        let mut delay = Duration::from_millis(self.config.initial_retry_delay_ms);
        let mut attempt = 1;

        loop {
            match self.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt >= max_attempts => {
                    warn!(url = %url, attempts = attempt, error = %e, "Fetch failed, giving up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        url = %url,
                        error = %e,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Fetch failed, retrying"
                    );

                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = std::cmp::min(delay * 2, max_delay);
                    attempt += 1;
                }
            }
        }
    }
}

fn request_error(err: reqwest::Error) -> FloodwatchError {
    if err.is_timeout() {
        FloodwatchError::Timeout
    } else {
        FloodwatchError::RequestFailed(err.to_string())
    }
}
