use thiserror::Error;

/// Errors that can occur when validating subscriber input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    #[error("Email address is required")]
    EmptyEmail,
    #[error("Email address too long (max 254 characters)")]
    EmailTooLong,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid or malformed token")]
    InvalidToken,
    #[error("Unknown subscriber status: {0}")]
    UnknownStatus(String),
}
