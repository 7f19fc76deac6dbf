//! Rewrite request assembly and the text-generation backend seam. The
//! prompt weights the original below the references (hard caps of 3500 vs
//! 2500 chars each) and demands raw HTML with no markdown fences.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use ai_client::util::{strip_code_blocks, truncate_to_char_boundary};
use ai_client::{retry_on_capacity, ChatClient, ChatMessage, CompletionClient, RetryPolicy};
use refresh_common::Config;

use crate::extract::ExtractedContent;
use crate::html::strip_html;

const SYSTEM_PROMPT: &str = "You are a senior editor who writes clean, structured HTML.";
const ORIGINAL_TEXT_CAP: usize = 3500;
const REFERENCE_TEXT_CAP: usize = 2500;
const TEMPERATURE: f32 = 0.7;
const MAX_NEW_TOKENS: u32 = 1200;

#[async_trait]
pub trait ArticleRewriter: Send + Sync {
    async fn rewrite(
        &self,
        title: &str,
        original_html: &str,
        references: &[ExtractedContent],
    ) -> Result<String>;
}

/// Build the single user prompt from the original article and the extracted
/// reference texts.
pub fn build_prompt(title: &str, original_text: &str, references: &[ExtractedContent]) -> String {
    let original = limit_text(original_text, ORIGINAL_TEXT_CAP);

    let reference_blocks: Vec<String> = references
        .iter()
        .enumerate()
        .map(|(index, r)| {
            let label = if r.title.is_empty() { &r.url } else { &r.title };
            format!(
                "Reference {} ({}):\n{}",
                index + 1,
                label,
                limit_text(&r.text, REFERENCE_TEXT_CAP)
            )
        })
        .collect();

    format!(
        "Rewrite the original article so its structure, tone, and formatting match the \
         reference articles. Keep the topic and key ideas, but improve clarity and flow. \
         Return valid HTML only (no Markdown, no code fences).\n\n\
         Original article title: {title}\n\
         Original content:\n{original}\n\n{}",
        reference_blocks.join("\n\n")
    )
}

/// Cap `text` at `max_bytes` on a char boundary, marking truncation with an
/// ellipsis.
fn limit_text(text: &str, max_bytes: usize) -> String {
    let truncated = truncate_to_char_boundary(text, max_bytes);
    if truncated.len() < text.len() {
        format!("{truncated}...")
    } else {
        truncated.to_string()
    }
}

enum RewriteBackend {
    Chat(ChatClient),
    Completion(CompletionClient),
}

/// Rewriter backed by a hosted text-generation endpoint, with bounded
/// retries on capacity errors.
pub struct LlmRewriter {
    backend: RewriteBackend,
    policy: RetryPolicy,
}

impl LlmRewriter {
    /// Select the backend from configuration. The missing credential is a
    /// fatal precondition, reported before any network call.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = if let Some(key) = &config.openai_api_key {
            info!(model = %config.openai_model, "Using chat-completion rewrite backend");
            RewriteBackend::Chat(
                ChatClient::new(key, &config.openai_model, &config.openai_base_url)
                    .with_timeout(config.request_timeout),
            )
        } else if let Some(key) = &config.hf_api_key {
            info!(model = %config.hf_model, "Using text-generation rewrite backend");
            RewriteBackend::Completion(
                CompletionClient::new(key, &config.hf_model, &config.hf_base_url)
                    .with_timeout(config.request_timeout),
            )
        } else {
            anyhow::bail!("Set OPENAI_API_KEY or HF_API_KEY to generate updated articles");
        };

        Ok(Self {
            backend,
            policy: RetryPolicy::default(),
        })
    }
}

#[async_trait]
impl ArticleRewriter for LlmRewriter {
    async fn rewrite(
        &self,
        title: &str,
        original_html: &str,
        references: &[ExtractedContent],
    ) -> Result<String> {
        let original_text = strip_html(original_html);
        let prompt = build_prompt(title, &original_text, references);

        let output = match &self.backend {
            RewriteBackend::Chat(client) => {
                retry_on_capacity(self.policy, || {
                    client.chat(
                        vec![
                            ChatMessage::system(SYSTEM_PROMPT),
                            ChatMessage::user(&prompt),
                        ],
                        TEMPERATURE,
                        None,
                    )
                })
                .await
            }
            RewriteBackend::Completion(client) => {
                retry_on_capacity(self.policy, || {
                    client.complete(&prompt, MAX_NEW_TOKENS, TEMPERATURE)
                })
                .await
            }
        }
        .context("Rewrite request failed")?;

        Ok(strip_code_blocks(&output).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(title: &str, url: &str, text: &str) -> ExtractedContent {
        ExtractedContent {
            title: title.to_string(),
            html: String::new(),
            text: text.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn prompt_contains_title_original_and_references() {
        let refs = vec![
            reference("Ref One", "https://example.com/a", "first reference body"),
            reference("", "https://other.org/b", "second reference body"),
        ];
        let prompt = build_prompt("My Title", "original body text", &refs);

        assert!(prompt.contains("Original article title: My Title"));
        assert!(prompt.contains("original body text"));
        assert!(prompt.contains("Reference 1 (Ref One):"));
        // Untitled references are labeled by URL.
        assert!(prompt.contains("Reference 2 (https://other.org/b):"));
        assert!(prompt.contains("no code fences"));
    }

    #[test]
    fn original_text_capped_with_ellipsis() {
        let long = "x".repeat(5000);
        let prompt = build_prompt("T", &long, &[]);
        assert!(prompt.contains(&format!("{}...", "x".repeat(ORIGINAL_TEXT_CAP))));
        assert!(!prompt.contains(&"x".repeat(ORIGINAL_TEXT_CAP + 1)));
    }

    #[test]
    fn reference_text_capped_independently() {
        let refs = vec![reference("R", "https://example.com/a", &"y".repeat(4000))];
        let prompt = build_prompt("T", "short", &refs);
        assert!(prompt.contains(&format!("{}...", "y".repeat(REFERENCE_TEXT_CAP))));
        assert!(!prompt.contains(&"y".repeat(REFERENCE_TEXT_CAP + 1)));
    }

    #[test]
    fn short_texts_not_marked() {
        let prompt = build_prompt("T", "short original", &[]);
        assert!(prompt.contains("short original\n"));
        assert!(!prompt.contains("short original..."));
    }
}
