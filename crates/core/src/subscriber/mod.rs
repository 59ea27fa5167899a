mod error;
mod links;
mod types;
mod validation;

pub use error::SubscriberError;
pub use links::{
    confirm_link, decode_token, encode_token, success_redirect, unsubscribe_link,
};
pub use types::{Subscriber, SubscriberStatus};
pub use validation::{validate_email, MAX_EMAIL_LENGTH};
