use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ScraperError;

/// Renders a JavaScript-heavy page and returns the resulting HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, ScraperError>;
}

/// Client for a Browserless-compatible `/content` endpoint.
///
/// Navigation waits for network idle, then a fixed settle delay. The whole
/// call is bounded by a hard timeout on top of the service's own.
pub struct BrowserlessRenderer {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    settle_ms: u64,
}

impl BrowserlessRenderer {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout_secs: u64,
        settle_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            timeout_secs,
            settle_ms,
        })
    }

    async fn content(&self, url: &str) -> Result<String, ScraperError> {
        let endpoint = format!("{}/content", self.base_url);
        let body = serde_json::json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.timeout_secs * 1000,
            },
            "waitForTimeout": self.settle_ms,
        });

        let mut request = self.client.post(&endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScraperError::Render(format!(
                "browserless returned HTTP {}: {}",
                status.as_u16(),
                message.trim()
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!(url, renderer = "browserless", "rendering page");
        let hard_limit =
            Duration::from_secs(self.timeout_secs) + Duration::from_millis(self.settle_ms);
        match tokio::time::timeout(hard_limit, self.content(url)).await {
            Ok(result) => result,
            Err(_) => Err(ScraperError::Timeout {
                url: url.to_string(),
                secs: hard_limit.as_secs(),
            }),
        }
    }
}
