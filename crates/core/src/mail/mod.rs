//! Outgoing email and the transport abstraction.

mod error;
mod traits;
mod types;

pub use error::MailError;
pub use traits::Mailer;
pub use types::OutgoingMail;
