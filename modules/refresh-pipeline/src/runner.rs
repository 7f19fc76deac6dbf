//! Run orchestration: strictly sequential batch processing with skip rules,
//! status-file updates at every transition, and fixed pacing between
//! published articles. Search failures and reference shortfalls skip the
//! article; rewrite and publish failures end the run.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};

use refresh_common::{Reference, RunStatus, StatusWriter};
use store_client::{ArticleReference, NewArticle, OriginalArticle};

use crate::extract::{ContentExtractor, ExtractedContent};
use crate::html::{append_references, ensure_article_wrapper, excerpt, strip_html};
use crate::rewrite::ArticleRewriter;
use crate::search::{build_search_query, filter_candidates, WebSearcher};
use crate::stats::RunStats;
use crate::traits::ArticleStore;

/// References required before an article is rewritten.
const MIN_REFERENCES: usize = 2;

/// Search results requested per query; headroom over the candidate ceiling
/// because classification discards most hits.
const SEARCH_RESULT_HEADROOM: usize = 4;

const EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub max_originals: usize,
    pub max_candidates: usize,
    pub skip_if_updated: bool,
    pub pace_delay: Duration,
    pub origin_host: Option<String>,
    pub proxy_host: Option<String>,
}

pub struct Runner {
    store: Box<dyn ArticleStore>,
    searcher: Box<dyn WebSearcher>,
    extractor: ContentExtractor,
    rewriter: Box<dyn ArticleRewriter>,
    status_writer: StatusWriter,
    options: RunnerOptions,
}

impl Runner {
    pub fn new(
        store: Box<dyn ArticleStore>,
        searcher: Box<dyn WebSearcher>,
        extractor: ContentExtractor,
        rewriter: Box<dyn ArticleRewriter>,
        status_writer: StatusWriter,
        options: RunnerOptions,
    ) -> Self {
        Self {
            store,
            searcher,
            extractor,
            rewriter,
            status_writer,
            options,
        }
    }

    /// Run the full batch. The status record is always finalized (success
    /// or error) before this returns, so an external observer never sees a
    /// run silently vanish.
    pub async fn run(&self) -> Result<RunStats> {
        let mut status = RunStatus::begin(0);
        self.write_status(&status);

        let result = self.run_inner(&mut status).await;

        match &result {
            Ok(stats) => {
                status.finish_success(format!(
                    "Run complete: {} published, {} skipped",
                    stats.published,
                    stats.skipped()
                ));
            }
            Err(e) => {
                status.finish_error(format!("Run failed: {e:#}"));
            }
        }
        self.write_status(&status);

        result
    }

    async fn run_inner(&self, status: &mut RunStatus) -> Result<RunStats> {
        let mut stats = RunStats::default();

        let originals = self
            .store
            .fetch_originals()
            .await
            .context("Failed to fetch original articles")?;

        let batch: Vec<OriginalArticle> = originals
            .into_iter()
            .take(self.options.max_originals)
            .collect();

        status.total_count = batch.len() as u32;
        status.touch(format!("Processing {} originals", batch.len()));
        self.write_status(status);

        for (index, original) in batch.iter().enumerate() {
            status.step(
                index as u32,
                &original.title,
                format!("Processing \"{}\"", original.title),
            );
            self.write_status(status);
            stats.processed += 1;

            if self.options.skip_if_updated && original.updated_count() > 0 {
                info!(title = %original.title, "Skipping (already updated)");
                stats.skipped_already_updated += 1;
                status.record_skip(format!("Skipped \"{}\" (already updated)", original.title));
                self.write_status(status);
                continue;
            }

            let candidates = self.find_candidates(original, status).await;
            if candidates.len() < MIN_REFERENCES {
                warn!(
                    title = %original.title,
                    found = candidates.len(),
                    needed = MIN_REFERENCES,
                    "Not enough reference candidates"
                );
                stats.skipped_few_candidates += 1;
                status.record_skip(format!(
                    "Skipped \"{}\" ({} candidates, need {})",
                    original.title,
                    candidates.len(),
                    MIN_REFERENCES
                ));
                self.write_status(status);
                continue;
            }

            let references = self
                .extract_references(original, &candidates, status, &mut stats)
                .await;
            if references.len() < MIN_REFERENCES {
                warn!(
                    title = %original.title,
                    extracted = references.len(),
                    needed = MIN_REFERENCES,
                    "Not enough extracted references"
                );
                stats.skipped_few_references += 1;
                status.record_skip(format!(
                    "Skipped \"{}\" ({} references extracted, need {})",
                    original.title,
                    references.len(),
                    MIN_REFERENCES
                ));
                self.write_status(status);
                continue;
            }

            self.rewrite_and_publish(original, references, status)
                .await?;
            stats.published += 1;

            tokio::time::sleep(self.options.pace_delay).await;
        }

        Ok(stats)
    }

    /// Search and filter. Provider failure downgrades to zero results so a
    /// flaky backend never aborts the batch.
    async fn find_candidates(
        &self,
        original: &OriginalArticle,
        status: &mut RunStatus,
    ) -> Vec<Reference> {
        let query = build_search_query(&original.title, self.options.origin_host.as_deref());
        status.touch(format!("Searching references for \"{}\"", original.title));
        self.write_status(status);

        let raw = match self
            .searcher
            .search(&query, self.options.max_candidates * SEARCH_RESULT_HEADROOM)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(
                    query,
                    provider = self.searcher.name(),
                    error = %e,
                    "Search failed, treating as zero results"
                );
                Vec::new()
            }
        };

        filter_candidates(
            raw,
            self.options.origin_host.as_deref(),
            self.options.proxy_host.as_deref(),
            self.options.max_candidates,
        )
    }

    /// Walk candidates in order until enough extractions succeed. Failed
    /// URLs do not count toward the minimum.
    async fn extract_references(
        &self,
        original: &OriginalArticle,
        candidates: &[Reference],
        status: &mut RunStatus,
        stats: &mut RunStats,
    ) -> Vec<(Reference, ExtractedContent)> {
        status.touch(format!(
            "Extracting content from {} candidates for \"{}\"",
            candidates.len(),
            original.title
        ));
        self.write_status(status);

        let mut references = Vec::new();
        for candidate in candidates {
            if references.len() >= MIN_REFERENCES {
                break;
            }
            match self.extractor.extract(&candidate.url).await {
                Some(content) => {
                    let title = reference_title(candidate, &content);
                    references.push((Reference::new(title, candidate.url.clone()), content));
                }
                None => {
                    stats.extraction_failures += 1;
                }
            }
        }
        references
    }

    async fn rewrite_and_publish(
        &self,
        original: &OriginalArticle,
        references: Vec<(Reference, ExtractedContent)>,
        status: &mut RunStatus,
    ) -> Result<()> {
        status.touch(format!("Rewriting \"{}\"", original.title));
        self.write_status(status);

        let (links, contents): (Vec<Reference>, Vec<ExtractedContent>) =
            references.into_iter().unzip();

        let rewritten = self
            .rewriter
            .rewrite(&original.title, &original.content_html, &contents)
            .await
            .with_context(|| format!("Rewrite failed for \"{}\"", original.title))?;

        let final_html = append_references(&ensure_article_wrapper(&rewritten), &links);
        let content_text = strip_html(&final_html);

        let article = NewArticle {
            title: format!("{} (Updated)", original.title),
            original_article_id: original.id,
            version: "updated".to_string(),
            source: "llm".to_string(),
            content_html: final_html,
            excerpt: excerpt(&content_text, EXCERPT_CHARS),
            content_text,
            references: links
                .iter()
                .map(|r| ArticleReference {
                    title: r.title.clone(),
                    url: r.url.clone(),
                })
                .collect(),
            published_at: Utc::now(),
        };

        let id = self
            .store
            .publish(&article)
            .await
            .with_context(|| format!("Publish failed for \"{}\"", original.title))?;

        info!(id, title = %article.title, "Published updated article");
        status.record_update(format!("Published updated article for \"{}\"", original.title));
        self.write_status(status);
        Ok(())
    }

    /// Status persistence is best-effort: a full disk must not kill a run
    /// that is otherwise making progress.
    fn write_status(&self, status: &RunStatus) {
        if let Err(e) = self.status_writer.write(status) {
            error!(error = %e, "Failed to write status file");
        }
    }
}

/// Prefer the search result's title; fall back to the extracted page title
/// when the search path only produced a bare URL.
fn reference_title(candidate: &Reference, content: &ExtractedContent) -> String {
    if candidate.title.is_empty() || candidate.title == candidate.url {
        if content.title.is_empty() {
            candidate.url.clone()
        } else {
            content.title.clone()
        }
    } else {
        candidate.title.clone()
    }
}
