use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An original article as served by `GET /articles?type=original&withUpdated=true`.
/// `updated_articles` carries the already-published rewrites linked to this
/// original; only its length matters to the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct OriginalArticle {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub updated_articles: Vec<UpdatedArticleRef>,
}

impl OriginalArticle {
    pub fn updated_count(&self) -> usize {
        self.updated_articles.len()
    }
}

/// Minimal reference to an existing updated article. The store returns full
/// article rows here; everything beyond the id is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedArticleRef {
    pub id: i64,
}

/// A reference link published alongside a rewritten article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleReference {
    pub title: String,
    pub url: String,
}

/// Payload for `POST /articles`.
#[derive(Debug, Clone, Serialize)]
pub struct NewArticle {
    pub title: String,
    pub original_article_id: i64,
    pub version: String,
    pub source: String,
    pub content_html: String,
    pub content_text: String,
    pub excerpt: String,
    pub references: Vec<ArticleReference>,
    pub published_at: DateTime<Utc>,
}

/// Response from `POST /articles`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedArticle {
    pub id: i64,
}
