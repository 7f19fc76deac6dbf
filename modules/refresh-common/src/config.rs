use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Which web-search backend to use. Keyword providers degrade to the
/// HTML-scrape path at selection time when their credential is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProviderKind {
    Serper,
    SerpApi,
    Html,
}

impl SearchProviderKind {
    fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "serper" => Ok(Self::Serper),
            "serpapi" => Ok(Self::SerpApi),
            "html" => Ok(Self::Html),
            other => bail!("Unknown SEARCH_PROVIDER: {other} (expected serper, serpapi, or html)"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Article store
    pub api_base_url: String,

    // Search
    pub search_provider: SearchProviderKind,
    pub serper_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,

    // Text generation
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub hf_api_key: Option<String>,
    pub hf_model: String,
    pub hf_base_url: String,

    // Extraction
    pub text_proxy_base_url: String,
    pub origin_host: Option<String>,

    // Run shape
    pub max_originals: usize,
    pub max_candidates: usize,
    pub request_timeout: Duration,
    pub skip_if_updated: bool,
    pub pace_delay: Duration,

    // Status reporting
    pub status_file: String,
}

impl Config {
    /// Load configuration from environment variables. Missing optional keys
    /// become `None`; malformed numeric values are errors, not panics, so
    /// the caller can record them in the status file before exiting.
    pub fn from_env() -> Result<Self> {
        let provider = env::var("SEARCH_PROVIDER").unwrap_or_else(|_| "serper".to_string());

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            search_provider: SearchProviderKind::parse(&provider)?,
            serper_api_key: optional_env("SERPER_API_KEY"),
            serpapi_api_key: optional_env("SERPAPI_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            hf_api_key: optional_env("HF_API_KEY"),
            hf_model: env::var("HF_MODEL")
                .unwrap_or_else(|_| "HuggingFaceH4/zephyr-7b-beta".to_string()),
            hf_base_url: env::var("HF_BASE_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co/models".to_string()),
            text_proxy_base_url: env::var("TEXT_PROXY_BASE_URL")
                .unwrap_or_else(|_| "https://r.jina.ai".to_string()),
            origin_host: optional_env("ORIGIN_HOST"),
            max_originals: parse_env("MAX_ORIGINALS", 5)?,
            max_candidates: parse_env("MAX_CANDIDATES", 5)?,
            request_timeout: Duration::from_millis(parse_env("REQUEST_TIMEOUT_MS", 20_000)?),
            skip_if_updated: env::var("SKIP_IF_UPDATED")
                .map(|v| v != "false")
                .unwrap_or(true),
            pace_delay: Duration::from_millis(parse_env("PACE_DELAY_MS", 1_000)?),
            status_file: env::var("STATUS_FILE")
                .unwrap_or_else(|_| "storage/automation-status.json".to_string()),
        })
    }

    /// The rewrite backend credential is the one hard precondition; it must
    /// be checked before any network call.
    pub fn has_rewrite_credential(&self) -> bool {
        self.openai_api_key.is_some() || self.hf_api_key.is_some()
    }

    /// Log the run-shaping settings without echoing any credential.
    pub fn log_redacted(&self) {
        info!(
            api_base_url = %self.api_base_url,
            search_provider = ?self.search_provider,
            serper_key = self.serper_api_key.is_some(),
            serpapi_key = self.serpapi_api_key.is_some(),
            openai_key = self.openai_api_key.is_some(),
            hf_key = self.hf_api_key.is_some(),
            max_originals = self.max_originals,
            max_candidates = self.max_candidates,
            skip_if_updated = self.skip_if_updated,
            status_file = %self.status_file,
            "Configuration loaded"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_known_values() {
        assert_eq!(
            SearchProviderKind::parse("serper").unwrap(),
            SearchProviderKind::Serper
        );
        assert_eq!(
            SearchProviderKind::parse("SerpApi").unwrap(),
            SearchProviderKind::SerpApi
        );
        assert_eq!(
            SearchProviderKind::parse("HTML").unwrap(),
            SearchProviderKind::Html
        );
        assert!(SearchProviderKind::parse("bing").is_err());
    }
}
