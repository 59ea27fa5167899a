//! Feed entries and the source they are read from.

mod error;
mod traits;
mod types;

pub use error::FeedError;
pub use traits::FeedSource;
pub use types::{is_new_entry, FeedEntry};
