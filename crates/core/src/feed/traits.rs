use async_trait::async_trait;

use super::{FeedEntry, FeedError};

/// Reads the entries of an RSS or Atom feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches and parses the feed at `url`, in document order.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError>;
}
