//! Web search providers. Keyword API providers degrade to the HTML-scrape
//! path at selection time when their credential is absent; the HTML path
//! goes through the text-rendering proxy because scraping the results page
//! directly is unreliable.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use refresh_common::{Config, Reference, SearchProviderKind};
use textproxy_client::TextProxyClient;

use crate::classify::is_likely_article;
use crate::urlnorm::{dedup_key, normalize};

#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Reference>>;
    fn name(&self) -> &str;
}

// --- Serper (Google Search API) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Reference>> {
        info!(query, max_results, "Serper search");

        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let resp = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Serper API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Serper API error ({status}): {body}");
        }

        let data: SerperResponse = resp
            .json()
            .await
            .context("Failed to parse Serper response")?;

        let results: Vec<Reference> = data
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| Reference::new(r.title, r.link))
            .collect();

        info!(query, count = results.len(), "Serper search complete");
        Ok(results)
    }

    fn name(&self) -> &str {
        "serper"
    }
}

// --- SerpApi ---

pub struct SerpApiSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiResult>,
}

#[derive(Debug, serde::Deserialize)]
struct SerpApiResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
}

impl SerpApiSearcher {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait]
impl WebSearcher for SerpApiSearcher {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<Reference>> {
        info!(query, "SerpApi search");

        let resp = self
            .client
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("SerpApi request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("SerpApi error ({status}): {body}");
        }

        let data: SerpApiResponse = resp
            .json()
            .await
            .context("Failed to parse SerpApi response")?;

        let results: Vec<Reference> = data
            .organic_results
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .map(|r| Reference::new(r.title, r.link))
            .collect();

        info!(query, count = results.len(), "SerpApi search complete");
        Ok(results)
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}

// --- HTML-scrape fallback through the text proxy ---

pub struct HtmlSearcher {
    proxy: Arc<TextProxyClient>,
}

impl HtmlSearcher {
    pub fn new(proxy: Arc<TextProxyClient>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl WebSearcher for HtmlSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Reference>> {
        info!(query, "HTML search via text proxy");

        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let target = format!("http://www.google.com/search?q={encoded}");

        // One retry with a doubled timeout: the proxy renders the page
        // through a real browser and cold paths regularly exceed the default.
        let page = match self.proxy.text(&target).await {
            Ok(page) => page,
            Err(e) if e.is_timeout() => {
                let doubled = self.proxy.default_timeout() * 2;
                warn!(
                    query,
                    timeout_secs = doubled.as_secs(),
                    "Search page fetch timed out, retrying with doubled timeout"
                );
                self.proxy
                    .text_with_timeout(&target, doubled)
                    .await
                    .context("Search page fetch failed after timeout retry")?
            }
            Err(e) => return Err(e).context("Search page fetch failed"),
        };

        let mut results = extract_result_urls(&page);
        results.truncate(max_results);
        info!(query, count = results.len(), "HTML search complete");
        Ok(results)
    }

    fn name(&self) -> &str {
        "html"
    }
}

/// Pull candidate URLs out of a proxy-rendered search results page using two
/// redundant patterns: markdown link syntax (keeps titles) and bare URL
/// scanning (catches whatever the link pass missed). Order follows the page.
pub fn extract_result_urls(page: &str) -> Vec<Reference> {
    let link_re = regex::Regex::new(r"\[([^\]]*)\]\((https?://[^)\s]+)\)").expect("valid regex");
    let bare_re = regex::Regex::new(r#"https?://[^\s"'<>)\]]+"#).expect("valid regex");

    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for cap in link_re.captures_iter(page) {
        let title = cap[1].trim().to_string();
        push_candidate(&cap[2], title, &mut seen, &mut results);
    }

    for m in bare_re.find_iter(page) {
        push_candidate(m.as_str(), String::new(), &mut seen, &mut results);
    }

    results
}

fn push_candidate(
    raw: &str,
    title: String,
    seen: &mut HashSet<String>,
    results: &mut Vec<Reference>,
) {
    let Some(url) = normalize(raw) else {
        return;
    };
    let Some(key) = dedup_key(&url) else {
        return;
    };
    if seen.insert(key) {
        let title = if title.is_empty() { url.clone() } else { title };
        results.push(Reference::new(title, url));
    }
}

// --- Provider selection ---

/// Pick the searcher for the configured provider. Keyword providers without
/// a credential degrade to the HTML-scrape path instead of failing.
pub fn build_searcher(config: &Config, proxy: Arc<TextProxyClient>) -> Box<dyn WebSearcher> {
    match config.search_provider {
        SearchProviderKind::Serper => match &config.serper_api_key {
            Some(key) => Box::new(SerperSearcher::new(key, config.request_timeout)),
            None => {
                warn!("SERPER_API_KEY not set, falling back to HTML search");
                Box::new(HtmlSearcher::new(proxy))
            }
        },
        SearchProviderKind::SerpApi => match &config.serpapi_api_key {
            Some(key) => Box::new(SerpApiSearcher::new(key, config.request_timeout)),
            None => {
                warn!("SERPAPI_API_KEY not set, falling back to HTML search");
                Box::new(HtmlSearcher::new(proxy))
            }
        },
        SearchProviderKind::Html => Box::new(HtmlSearcher::new(proxy)),
    }
}

// --- Caller-side candidate filtering ---

/// Classify, normalize, and dedup raw search results, keeping the first
/// `max_candidates` distinct accepted URLs in page order. First match wins;
/// there is no relevance signal beyond search-engine ordering.
pub fn filter_candidates(
    results: Vec<Reference>,
    origin_host: Option<&str>,
    proxy_host: Option<&str>,
    max_candidates: usize,
) -> Vec<Reference> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for result in results {
        if accepted.len() >= max_candidates {
            break;
        }
        let Some(url) = normalize(&result.url) else {
            continue;
        };
        if !is_likely_article(&url, origin_host, proxy_host) {
            continue;
        }
        let Some(key) = dedup_key(&url) else {
            continue;
        };
        if seen.insert(key) {
            accepted.push(Reference::new(result.title, url));
        }
    }

    accepted
}

/// Build the search query from an article title, stripping the origin
/// site's boilerplate branding suffix (`… | Brand`, `… - Brand`).
pub fn build_search_query(title: &str, origin_host: Option<&str>) -> String {
    let Some(origin) = origin_host else {
        return title.trim().to_string();
    };
    let brand = origin
        .trim_start_matches("www.")
        .split('.')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if brand.is_empty() {
        return title.trim().to_string();
    }

    for separator in [" | ", " - ", " – "] {
        if let Some((head, tail)) = title.rsplit_once(separator) {
            if tail.trim().to_lowercase().replace(' ', "") == brand {
                return head.trim().to_string();
            }
        }
    }

    title.trim().to_string()
}
