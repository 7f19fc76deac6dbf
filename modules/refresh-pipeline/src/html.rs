//! HTML assembly for the published article: plain-text rendering of model
//! output, the `<article>` wrapper, and the generated References section.

use scraper::{Html, Selector};

use refresh_common::Reference;

/// Visible text of an HTML fragment, whitespace-collapsed. Fragments
/// without a body still render through the implicit document body.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let doc = Html::parse_document(html);
    let selector = Selector::parse("body").expect("valid selector");

    let raw: String = match doc.select(&selector).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => doc.root_element().text().collect::<Vec<_>>().join(" "),
    };

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Wrap model output in `<article>` unless it already is.
pub fn ensure_article_wrapper(html: &str) -> String {
    let trimmed = html.trim();
    if trimmed.starts_with("<article") {
        return trimmed.to_string();
    }
    format!("<article>{trimmed}</article>")
}

/// Append the generated References section listing the accepted reference
/// links in extraction order.
pub fn append_references(content_html: &str, references: &[Reference]) -> String {
    let items: String = references
        .iter()
        .map(|r| {
            format!(
                r#"<li><a href="{}" rel="noopener noreferrer">{}</a></li>"#,
                escape(&r.url),
                escape(&r.title)
            )
        })
        .collect();

    format!(
        "{content_html}\n<hr />\n<section class=\"references\">\n  <h2>References</h2>\n  <ul>{items}</ul>\n</section>"
    )
}

/// First `max_chars` characters of a text, cut at a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_collapses_whitespace() {
        let html = "<article><h1>Title</h1>\n<p>First   paragraph.</p>\n<p>Second.</p></article>";
        assert_eq!(strip_html(html), "Title First paragraph. Second.");
    }

    #[test]
    fn strip_html_empty_input() {
        assert_eq!(strip_html(""), "");
        assert_eq!(strip_html("   "), "");
    }

    #[test]
    fn wrapper_added_only_when_missing() {
        assert_eq!(ensure_article_wrapper("<p>x</p>"), "<article><p>x</p></article>");
        assert_eq!(
            ensure_article_wrapper("  <article class=\"post\"><p>x</p></article>"),
            "<article class=\"post\"><p>x</p></article>"
        );
    }

    #[test]
    fn references_section_lists_links_in_order() {
        let refs = vec![
            Reference::new("First Ref", "https://example.com/a"),
            Reference::new("Second Ref", "https://other.org/b"),
        ];
        let html = append_references("<article><p>Body</p></article>", &refs);

        assert!(html.contains("<h2>References</h2>"));
        let first = html.find("https://example.com/a").unwrap();
        let second = html.find("https://other.org/b").unwrap();
        assert!(first < second);
        assert!(html.contains(">First Ref</a>"));
    }

    #[test]
    fn reference_titles_are_escaped() {
        let refs = vec![Reference::new("A <b>bold</b> & risky title", "https://example.com/a?x=1&y=2")];
        let html = append_references("<article></article>", &refs);
        assert!(html.contains("A &lt;b&gt;bold&lt;/b&gt; &amp; risky title"));
        assert!(html.contains("https://example.com/a?x=1&amp;y=2"));
    }

    #[test]
    fn excerpt_cuts_at_char_boundary() {
        assert_eq!(excerpt("hello world", 5), "hello");
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("short", 200), "short");
    }
}
