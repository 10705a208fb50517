use std::future::Future;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::route::encode_component;

const USER_AGENT: &str = concat!("livetv/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog base url {0:?}")]
    InvalidBaseUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("catalog returned HTTP {0}")]
    Status(StatusCode),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    /// Transport failures, 5xx and 429 are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::InvalidBaseUrl(_) | Self::Decode(_) => false,
        }
    }

    /// Stable text for the UI. Raw errors go to the log only.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidBaseUrl(_) => "Catalog address is misconfigured.".to_string(),
            Self::Transport(_) => "Failed to load streams. Check your connection.".to_string(),
            Self::Status(status) => format!("Failed to load streams (HTTP {}).", status.as_u16()),
            Self::Decode(_) => "Failed to load streams: unexpected response.".to_string(),
        }
    }
}

/// Anything that can answer the two catalog queries.
pub trait CatalogSource: Send + Sync + 'static {
    fn categories(&self) -> impl Future<Output = Result<Vec<String>, CatalogError>> + Send;

    fn channels(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<Channel>, CatalogError>> + Send;
}

/// HTTP client for the remote catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url)
            .map_err(|_| CatalogError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn categories_url(&self) -> String {
        format!("{}/", self.base)
    }

    /// The category is the whole query string, not a `key=value` pair.
    pub fn channels_url(&self, category: &str) -> String {
        format!("{}/?{}", self.base, encode_component(category))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("catalog {} -> {}", url, status);
            return Err(CatalogError::Status(status));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl CatalogSource for CatalogClient {
    async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        self.get_json(&self.categories_url()).await
    }

    async fn channels(&self, category: &str) -> Result<Vec<Channel>, CatalogError> {
        self.get_json(&self.channels_url(category)).await
    }
}

/// Exponential backoff between attempts of one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based): base, 2×base, 4×base…
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    "{} failed ({}), retry {}/{} in {:?}",
                    what, e, attempt, policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
