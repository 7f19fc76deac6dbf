pub mod error;
pub mod types;

pub use error::{Result, StoreError};
pub use types::{ArticleReference, CreatedArticle, NewArticle, OriginalArticle, UpdatedArticleRef};

use std::time::Duration;

pub struct StoreClient {
    client: reqwest::Client,
    base_url: String,
}

impl StoreClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch original articles together with their existing rewrites.
    pub async fn fetch_originals(&self) -> Result<Vec<OriginalArticle>> {
        let url = format!("{}/articles", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("type", "original"), ("withUpdated", "true")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let originals: Vec<OriginalArticle> = resp.json().await?;
        tracing::info!(count = originals.len(), "Fetched original articles");
        Ok(originals)
    }

    /// Publish a rewritten article. Returns the created article id.
    pub async fn publish(&self, article: &NewArticle) -> Result<i64> {
        let url = format!("{}/articles", self.base_url);

        let resp = self.client.post(&url).json(article).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let created: CreatedArticle = resp.json().await?;
        tracing::info!(
            id = created.id,
            original_id = article.original_article_id,
            "Published updated article"
        );
        Ok(created.id)
    }
}
