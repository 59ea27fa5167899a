//! Fetches feeds over HTTP and parses them with feed-rs.

use std::time::Duration;

use async_trait::async_trait;
use feed_rs::model::Feed;

use feedletter_core::feed::{FeedEntry, FeedError, FeedSource};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads RSS and Atom feeds over HTTP.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new() -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("feedletter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| FeedError::Http(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?;

        parse_entries(&body)
    }
}

/// Parses an RSS or Atom document into entries, in document order.
pub fn parse_entries(document: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let feed = feed_rs::parser::parse(document).map_err(|e| FeedError::Parse(e.to_string()))?;
    Ok(entries_from_feed(feed))
}

/// Only the publication date is used; `updated` never makes an entry new.
fn entries_from_feed(feed: Feed) -> Vec<FeedEntry> {
    feed.entries
        .into_iter()
        .map(|entry| FeedEntry {
            title: entry
                .title
                .map(|title| title.content.trim().to_string())
                .unwrap_or_default(),
            link: entry
                .links
                .into_iter()
                .next()
                .map(|link| link.href)
                .unwrap_or_default(),
            description: entry.summary.map(|summary| summary.content),
            published: entry.published,
        })
        .collect()
}
