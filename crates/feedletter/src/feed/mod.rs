//! Feed source implementations.

mod http;

pub use http::HttpFeedSource;
