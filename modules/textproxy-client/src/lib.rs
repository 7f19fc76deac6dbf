pub mod error;

pub use error::{Result, TextProxyError};

use std::time::Duration;

/// Client for a text-rendering proxy that returns a markdown rendition of
/// any public web page via `GET {base}/{url}`.
pub struct TextProxyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl TextProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Fetch the markdown rendition of `url` using the default timeout.
    pub async fn text(&self, url: &str) -> Result<String> {
        self.text_with_timeout(url, self.timeout).await
    }

    /// Fetch the markdown rendition of `url` with an explicit timeout.
    /// Callers retrying after a timeout pass a larger value here.
    pub async fn text_with_timeout(&self, url: &str, timeout: Duration) -> Result<String> {
        let endpoint = format!("{}/{}", self.base_url, url);

        let resp = self
            .client
            .get(&endpoint)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TextProxyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        tracing::debug!(url, bytes = body.len(), "Text proxy fetch complete");
        Ok(body)
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Host portion of the proxy base URL, used to keep the proxy itself
    /// out of reference candidate lists.
    pub fn host(&self) -> &str {
        self.base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or("")
    }
}
