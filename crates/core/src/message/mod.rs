mod error;
mod operations;
mod types;

pub use error::MessageError;
pub use operations::{compose, personalize, strip_html, UNSUBSCRIBE_PLACEHOLDER};
pub use types::{Message, MessageCounts, MessageStatus, QueuedMessage};
