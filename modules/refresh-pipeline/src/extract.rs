//! Content extraction for arbitrary uncontrolled web pages. An ordered
//! chain of tiers, each attempted only after the previous one failed or
//! produced nothing usable: Readability isolation, raw DOM title/body text,
//! then the text-rendering proxy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{debug, info, warn};

use textproxy_client::TextProxyClient;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122 Safari/537.36";

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    /// Isolated article HTML. Empty when only a text fallback succeeded.
    pub html: String,
    pub text: String,
    pub url: String,
}

#[async_trait]
pub trait ExtractTier: Send + Sync {
    /// `Ok(None)` means the tier ran but found nothing usable; errors are
    /// logged by the walker and treated the same way.
    async fn extract(&self, url: &str) -> Result<Option<ExtractedContent>>;
    fn name(&self) -> &str;
}

/// Walks the tier chain and stops at the first usable result.
pub struct ContentExtractor {
    tiers: Vec<Box<dyn ExtractTier>>,
}

impl ContentExtractor {
    pub fn new(timeout: Duration, proxy: Arc<TextProxyClient>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            tiers: vec![
                Box::new(ReadabilityTier { http: http.clone() }),
                Box::new(RawDomTier { http }),
                Box::new(ProxyTextTier { proxy }),
            ],
        }
    }

    /// Replace the tier chain. Used by tests to inject stub tiers.
    pub fn with_tiers(tiers: Vec<Box<dyn ExtractTier>>) -> Self {
        Self { tiers }
    }

    pub async fn extract(&self, url: &str) -> Option<ExtractedContent> {
        for tier in &self.tiers {
            match tier.extract(url).await {
                Ok(Some(content)) if !content.text.trim().is_empty() => {
                    info!(
                        url,
                        tier = tier.name(),
                        chars = content.text.len(),
                        "Content extracted"
                    );
                    return Some(content);
                }
                Ok(_) => {
                    debug!(url, tier = tier.name(), "Tier produced no usable content");
                }
                Err(e) => {
                    warn!(url, tier = tier.name(), error = %e, "Tier failed, trying next");
                }
            }
        }

        warn!(url, "All extraction tiers failed");
        None
    }
}

async fn fetch_page(http: &reqwest::Client, url: &str) -> Result<String> {
    let resp = http.get(url).send().await.context("Page fetch failed")?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("Page fetch returned HTTP {status}");
    }
    resp.text().await.context("Failed to read page body")
}

// --- Tier 1: Readability isolation ---

struct ReadabilityTier {
    http: reqwest::Client,
}

#[async_trait]
impl ExtractTier for ReadabilityTier {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedContent>> {
        let page = fetch_page(&self.http, url).await?;
        Ok(readability_extract(url, &page))
    }

    fn name(&self) -> &str {
        "readability"
    }
}

/// Run the Readability transform over fetched HTML, once for the isolated
/// article HTML and once for markdown text. Sync on purpose: the DOM types
/// involved are not Send and must not live across an await point.
fn readability_extract(url: &str, page: &str) -> Option<ExtractedContent> {
    let parsed_url = url::Url::parse(url).ok();

    let text_config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let text = transform_content_input(
        TransformInput {
            url: parsed_url.as_ref(),
            content: page.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        },
        &text_config,
    );

    if text.trim().is_empty() {
        return None;
    }

    let html_config = TransformConfig {
        readability: true,
        main_content: true,
        return_format: ReturnFormat::Raw,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let html = transform_content_input(
        TransformInput {
            url: parsed_url.as_ref(),
            content: page.as_bytes(),
            screenshot_bytes: None,
            encoding: None,
            selector_config: None,
            ignore_tags: None,
        },
        &html_config,
    );

    let title = dom_title(page).unwrap_or_else(|| url.to_string());

    Some(ExtractedContent {
        title,
        html,
        text,
        url: url.to_string(),
    })
}

// --- Tier 2: raw DOM title + body text ---

struct RawDomTier {
    http: reqwest::Client,
}

#[async_trait]
impl ExtractTier for RawDomTier {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedContent>> {
        let page = fetch_page(&self.http, url).await?;
        Ok(dom_extract(url, &page))
    }

    fn name(&self) -> &str {
        "raw-dom"
    }
}

fn dom_extract(url: &str, page: &str) -> Option<ExtractedContent> {
    let text = dom_body_text(page);
    if text.trim().is_empty() {
        return None;
    }

    Some(ExtractedContent {
        title: dom_title(page).unwrap_or_else(|| url.to_string()),
        html: String::new(),
        text,
        url: url.to_string(),
    })
}

fn dom_title(page: &str) -> Option<String> {
    let doc = Html::parse_document(page);
    let selector = Selector::parse("title").expect("valid selector");
    doc.select(&selector)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn dom_body_text(page: &str) -> String {
    let doc = Html::parse_document(page);
    let selector = Selector::parse("body").expect("valid selector");
    doc.select(&selector)
        .flat_map(|body| body.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Tier 3: text proxy markdown ---

struct ProxyTextTier {
    proxy: Arc<TextProxyClient>,
}

#[async_trait]
impl ExtractTier for ProxyTextTier {
    async fn extract(&self, url: &str) -> Result<Option<ExtractedContent>> {
        let rendered = self
            .proxy
            .text(url)
            .await
            .context("Text proxy fetch failed")?;
        Ok(strip_proxy_preamble(url, &rendered))
    }

    fn name(&self) -> &str {
        "proxy-text"
    }
}

/// The proxy prefixes its markdown rendition with a fixed header block:
/// `Title:`, `URL Source:`, optionally `Published Time:`, then
/// `Markdown Content:` followed by the body. Keep the title, drop the rest.
fn strip_proxy_preamble(url: &str, rendered: &str) -> Option<ExtractedContent> {
    let mut title = None;
    let mut body_start = 0;
    let mut in_preamble = true;

    for line in rendered.split_inclusive('\n') {
        if !in_preamble {
            break;
        }
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("Title:") {
            title = Some(value.trim().to_string()).filter(|t| !t.is_empty());
            body_start += line.len();
        } else if trimmed.strip_prefix("URL Source:").is_some()
            || trimmed.strip_prefix("Published Time:").is_some()
            || trimmed.is_empty()
        {
            body_start += line.len();
        } else if trimmed.strip_prefix("Markdown Content:").is_some() {
            body_start += line.len();
            in_preamble = false;
        } else {
            // No recognized header line: the body starts here.
            in_preamble = false;
        }
    }

    let text = rendered[body_start..].trim().to_string();
    if text.is_empty() {
        return None;
    }

    Some(ExtractedContent {
        title: title.unwrap_or_else(|| url.to_string()),
        html: String::new(),
        text,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct StubTier {
        name: &'static str,
        result: Mutex<Option<ExtractedContent>>,
        fail: bool,
        calls: AtomicU32,
    }

    impl StubTier {
        fn success(name: &'static str, text: &str) -> Self {
            Self {
                name,
                result: Mutex::new(Some(ExtractedContent {
                    title: format!("{name} title"),
                    html: String::new(),
                    text: text.to_string(),
                    url: String::new(),
                })),
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn empty(name: &'static str) -> Self {
            Self {
                name,
                result: Mutex::new(None),
                fail: false,
                calls: AtomicU32::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                result: Mutex::new(None),
                fail: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ExtractTier for Arc<StubTier> {
        async fn extract(&self, url: &str) -> Result<Option<ExtractedContent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stub tier failure");
            }
            Ok(self.result.lock().unwrap().clone().map(|mut c| {
                c.url = url.to_string();
                c
            }))
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn first_tier_success_stops_the_chain() {
        let first = Arc::new(StubTier::success("first", "body"));
        let second = Arc::new(StubTier::success("second", "other"));
        let extractor =
            ContentExtractor::with_tiers(vec![Box::new(first.clone()), Box::new(second.clone())]);

        let content = extractor.extract("https://example.com/a").await.unwrap();
        assert_eq!(content.title, "first title");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_result_falls_through_to_next_tier() {
        let first = Arc::new(StubTier::empty("first"));
        let second = Arc::new(StubTier::success("second", "fallback body"));
        let extractor =
            ContentExtractor::with_tiers(vec![Box::new(first.clone()), Box::new(second.clone())]);

        let content = extractor.extract("https://example.com/a").await.unwrap();
        assert_eq!(content.title, "second title");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tier_error_is_a_fallthrough_not_an_abort() {
        let first = Arc::new(StubTier::failing("first"));
        let second = Arc::new(StubTier::success("second", "fallback body"));
        let extractor =
            ContentExtractor::with_tiers(vec![Box::new(first.clone()), Box::new(second.clone())]);

        let content = extractor.extract("https://example.com/a").await.unwrap();
        assert_eq!(content.title, "second title");
    }

    #[tokio::test]
    async fn all_tiers_failing_yields_none() {
        let extractor = ContentExtractor::with_tiers(vec![
            Box::new(Arc::new(StubTier::failing("first"))),
            Box::new(Arc::new(StubTier::empty("second"))),
        ]);

        assert!(extractor.extract("https://example.com/a").await.is_none());
    }

    #[test]
    fn dom_title_and_body_text() {
        let page = "<html><head><title> Page Title </title></head>\
                    <body><p>First.</p><p>Second.</p></body></html>";
        assert_eq!(dom_title(page).as_deref(), Some("Page Title"));
        let text = dom_body_text(page);
        assert!(text.contains("First."));
        assert!(text.contains("Second."));
    }

    #[test]
    fn dom_extract_rejects_empty_body() {
        let page = "<html><head><title>T</title></head><body>  </body></html>";
        assert!(dom_extract("https://example.com/a", page).is_none());
    }

    #[test]
    fn proxy_preamble_stripped_and_title_kept() {
        let rendered = "Title: A Real Article\n\
                        URL Source: https://example.com/a\n\
                        Published Time: 2024-05-01\n\
                        Markdown Content:\n\
                        The body starts here.\n\nMore body.";
        let content = strip_proxy_preamble("https://example.com/a", rendered).unwrap();
        assert_eq!(content.title, "A Real Article");
        assert!(content.text.starts_with("The body starts here."));
        assert!(!content.text.contains("URL Source:"));
        assert!(content.html.is_empty());
    }

    #[test]
    fn proxy_output_without_preamble_used_whole() {
        let rendered = "Just markdown with no header block.";
        let content = strip_proxy_preamble("https://example.com/a", rendered).unwrap();
        assert_eq!(content.text, "Just markdown with no header block.");
        assert_eq!(content.title, "https://example.com/a");
    }

    #[test]
    fn proxy_empty_body_is_none() {
        let rendered = "Title: Empty\nURL Source: x\nMarkdown Content:\n   ";
        assert!(strip_proxy_preamble("https://example.com/a", rendered).is_none());
    }
}
