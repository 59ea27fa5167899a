use thiserror::Error;

/// Errors raised while reading a feed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Failed to fetch feed: {0}")]
    Http(String),
    #[error("Failed to parse feed: {0}")]
    Parse(String),
}
