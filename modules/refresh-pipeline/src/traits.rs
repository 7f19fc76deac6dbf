use anyhow::Result;
use async_trait::async_trait;

use store_client::{NewArticle, OriginalArticle, StoreClient};

/// Article store boundary as the pipeline sees it. The production impl is
/// the REST client; tests supply in-memory fakes.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn fetch_originals(&self) -> Result<Vec<OriginalArticle>>;
    async fn publish(&self, article: &NewArticle) -> Result<i64>;
}

#[async_trait]
impl ArticleStore for StoreClient {
    async fn fetch_originals(&self) -> Result<Vec<OriginalArticle>> {
        StoreClient::fetch_originals(self)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
    }

    async fn publish(&self, article: &NewArticle) -> Result<i64> {
        StoreClient::publish(self, article)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
    }
}
