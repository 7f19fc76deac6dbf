//! URL normalization for candidate dedup: search-engine redirect wrappers
//! unwrapped, fragments stripped, default ports and trailing slashes
//! removed, trailing punctuation (from regex scans over rendered text)
//! trimmed.

use url::Url;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];

/// Unwrap a `google.com/url?q=<target>` redirect to its target parameter.
/// Non-redirect URLs pass through unchanged.
pub fn unwrap_redirect(raw: &str) -> String {
    if let Ok(parsed) = Url::parse(raw) {
        let host = parsed
            .host_str()
            .unwrap_or("")
            .trim_start_matches("www.");
        if (host == "google.com" || host.ends_with(".google.com")) && parsed.path() == "/url" {
            if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "q") {
                return target.into_owned();
            }
        }
    }
    raw.to_string()
}

/// Normalize a URL for fetching and dedup. Returns `None` for anything that
/// does not parse as an absolute http(s) URL.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let unwrapped = unwrap_redirect(trimmed);
    let unwrapped = unwrapped.trim_end_matches(TRAILING_PUNCTUATION);

    let mut parsed = Url::parse(unwrapped).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.host_str()?;

    parsed.set_fragment(None);

    if parsed.port() == Some(80) && parsed.scheme() == "http"
        || parsed.port() == Some(443) && parsed.scheme() == "https"
    {
        let _ = parsed.set_port(None);
    }

    let mut result = parsed.to_string();
    if result.ends_with('/') {
        result.pop();
    }

    Some(result)
}

/// Dedup key: scheme + host + path, ignoring query and fragment, so the
/// same article reached through different tracking parameters collapses to
/// one candidate.
pub fn dedup_key(raw: &str) -> Option<String> {
    let normalized = normalize(raw)?;
    let parsed = Url::parse(&normalized).ok()?;
    let path = parsed.path().trim_end_matches('/');
    Some(format!(
        "{}://{}{}",
        parsed.scheme(),
        parsed.host_str()?.trim_start_matches("www."),
        path
    ))
}
