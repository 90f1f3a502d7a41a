use crate::core::error::FetchError;
use crate::core::types::{NewsItem, SocialPost};
use async_trait::async_trait;
use tracing::warn;

/// Recent news articles for a query.
#[async_trait]
pub trait NewsSource: Send + Sync + 'static {
    async fn try_fetch(
        &self,
        query: &str,
        window_hours: i64,
        max_items: usize,
    ) -> Result<Vec<NewsItem>, FetchError>;

    /// An unavailable source looks the same as one with nothing to report.
    async fn fetch(&self, query: &str, window_hours: i64, max_items: usize) -> Vec<NewsItem> {
        match self.try_fetch(query, window_hours, max_items).await {
            Ok(items) => items,
            Err(e) => {
                warn!(?e, "News fetch failed, continuing without news");
                Vec::new()
            }
        }
    }
}

/// Recent social posts for a query.
#[async_trait]
pub trait SocialSource: Send + Sync + 'static {
    async fn try_fetch(
        &self,
        query: &str,
        window_hours: i64,
        max_items: usize,
    ) -> Result<Vec<SocialPost>, FetchError>;

    async fn fetch(&self, query: &str, window_hours: i64, max_items: usize) -> Vec<SocialPost> {
        match self.try_fetch(query, window_hours, max_items).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(?e, "Social fetch failed, continuing without posts");
                Vec::new()
            }
        }
    }
}
