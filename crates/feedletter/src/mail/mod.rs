//! Mailer implementations and the emails the server sends.

mod log;
mod smtp;
pub mod templates;

pub use log::LogMailer;
pub use smtp::SmtpMailer;
