use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::error::{AiError, Result};
use crate::types::*;

/// Client for a legacy hosted-inference endpoint that takes a single prompt
/// string and returns `generated_text`. The model id is part of the URL.
pub struct CompletionClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl CompletionClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiError::Network(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn complete(
        &self,
        prompt: &str,
        max_new_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let url = format!("{}/{}", self.base_url, urlencode(&self.model));
        let request = CompletionRequest {
            inputs: prompt.to_string(),
            parameters: CompletionParameters {
                max_new_tokens,
                temperature,
                return_full_text: false,
            },
        };

        debug!(model = %self.model, "Text generation request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::from_response(status.as_u16(), body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        completion
            .into_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AiError::Empty)
    }
}

/// Percent-encode the path-reserved characters that appear in model ids
/// (`org/model` slashes stay meaningful to the endpoint, so only spaces and
/// non-URL-safe bytes are escaped).
fn urlencode(model: &str) -> String {
    model
        .chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            c if c.is_ascii_alphanumeric() || "-_./".contains(c) => c.to_string(),
            c => format!("%{:02X}", c as u32),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_slash_preserved() {
        assert_eq!(
            urlencode("HuggingFaceH4/zephyr-7b-beta"),
            "HuggingFaceH4/zephyr-7b-beta"
        );
    }

    #[test]
    fn model_id_space_escaped() {
        assert_eq!(urlencode("a b"), "a%20b");
    }
}
