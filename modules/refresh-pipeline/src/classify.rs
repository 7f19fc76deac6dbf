//! URL classification: decides whether a search hit plausibly points at a
//! standalone article. Total function; malformed input is rejected, never an
//! error, because every URL here is publisher- or attacker-controlled.

use url::Url;

/// Hosts that never serve standalone articles: search engines, social
/// networks, video/image hosts, marketplaces. Matched as exact host or
/// parent domain after stripping `www.`.
const DENY_HOSTS: &[&str] = &[
    // Search engines and their asset domains
    "google.com",
    "googleusercontent.com",
    "bing.com",
    "duckduckgo.com",
    "search.yahoo.com",
    "baidu.com",
    // Social networks
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "tiktok.com",
    "reddit.com",
    "linkedin.com",
    "pinterest.com",
    // Video and image hosts
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "imgur.com",
    "flickr.com",
    // Marketplaces
    "amazon.com",
    "ebay.com",
    "etsy.com",
];

/// Path extensions that indicate a media file or asset, not a document.
const SKIP_EXTENSIONS: &[&str] = &[
    ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".mp3", ".mp4", ".avi",
    ".mov", ".webm", ".zip", ".gz", ".tar", ".rar", ".exe", ".dmg", ".css", ".js",
];

/// Path segments used for listing/admin pages rather than articles.
const ADMIN_SEGMENTS: &[&str] = &["tag", "category", "author", "page", "search", "feed"];

/// Returns true when `url` looks like a standalone article worth extracting.
/// `origin_host` is the site being refreshed (its own pages must not become
/// references for themselves); `proxy_host` is the text-rendering proxy.
pub fn is_likely_article(url: &str, origin_host: Option<&str>, proxy_host: Option<&str>) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    let host = match parsed.host_str() {
        Some(h) => h.trim_start_matches("www.").to_lowercase(),
        None => return false,
    };

    if DENY_HOSTS.iter().any(|deny| host_matches(&host, deny)) {
        return false;
    }

    if let Some(proxy) = proxy_host {
        if host_matches(&host, &proxy.trim_start_matches("www.").to_lowercase()) {
            return false;
        }
    }

    if let Some(origin) = origin_host {
        if host_matches(&host, &origin.trim_start_matches("www.").to_lowercase()) {
            return false;
        }
    }

    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return false;
    }

    let path_lower = path.to_lowercase();
    if SKIP_EXTENSIONS.iter().any(|ext| path_lower.ends_with(ext)) {
        return false;
    }

    !path_lower
        .split('/')
        .any(|segment| ADMIN_SEGMENTS.contains(&segment))
}

/// Exact host or subdomain-of match: `news.google.com` matches `google.com`
/// but `notgoogle.com` does not.
fn host_matches(host: &str, deny: &str) -> bool {
    host == deny || host.ends_with(&format!(".{deny}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_article_paths() {
        assert!(is_likely_article(
            "https://example.com/2024/05/how-chatbots-learn",
            None,
            None
        ));
        assert!(is_likely_article(
            "https://blog.example.org/posts/rust-pipelines",
            None,
            None
        ));
    }

    #[test]
    fn rejects_denylisted_hosts() {
        assert!(!is_likely_article("https://www.google.com/a/b", None, None));
        assert!(!is_likely_article("https://news.google.com/articles/x", None, None));
        assert!(!is_likely_article("https://youtube.com/watch?v=abc", None, None));
        assert!(!is_likely_article("https://x.com/someone/status/1", None, None));
        assert!(!is_likely_article("https://www.amazon.com/dp/B000", None, None));
    }

    #[test]
    fn subdomain_matching_is_not_substring_matching() {
        assert!(is_likely_article("https://notgoogle.com/article", None, None));
        assert!(!is_likely_article("https://images.google.com/article", None, None));
    }

    #[test]
    fn rejects_proxy_and_origin_hosts() {
        assert!(!is_likely_article(
            "https://r.jina.ai/https://example.com/a",
            None,
            Some("r.jina.ai")
        ));
        assert!(!is_likely_article(
            "https://beyondchats.com/blogs/some-post",
            Some("beyondchats.com"),
            None
        ));
        assert!(!is_likely_article(
            "https://www.beyondchats.com/blogs/some-post",
            Some("beyondchats.com"),
            None
        ));
    }

    #[test]
    fn rejects_empty_and_root_paths() {
        assert!(!is_likely_article("https://example.com", None, None));
        assert!(!is_likely_article("https://example.com/", None, None));
    }

    #[test]
    fn rejects_non_document_extensions() {
        assert!(!is_likely_article("https://example.com/report.pdf", None, None));
        assert!(!is_likely_article("https://example.com/photo.JPG", None, None));
        assert!(!is_likely_article("https://example.com/app.js", None, None));
    }

    #[test]
    fn rejects_admin_path_segments() {
        assert!(!is_likely_article("https://example.com/tag/rust", None, None));
        assert!(!is_likely_article("https://example.com/blog/category/ai", None, None));
        assert!(!is_likely_article("https://example.com/author/jane", None, None));
        assert!(!is_likely_article("https://example.com/page/2", None, None));
        assert!(!is_likely_article("https://example.com/search", None, None));
        assert!(!is_likely_article("https://example.com/feed", None, None));
    }

    #[test]
    fn admin_words_inside_slugs_are_fine() {
        assert!(is_likely_article(
            "https://example.com/tagging-systems-explained",
            None,
            None
        ));
        assert!(is_likely_article(
            "https://example.com/authoring-tools",
            None,
            None
        ));
    }

    #[test]
    fn malformed_urls_are_rejected_not_errors() {
        assert!(!is_likely_article("not a url", None, None));
        assert!(!is_likely_article("ftp://example.com/file", None, None));
        assert!(!is_likely_article("", None, None));
        assert!(!is_likely_article("javascript:void(0)", None, None));
    }
}
