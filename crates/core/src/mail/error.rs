use thiserror::Error;

/// Errors raised while building or delivering an email.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Transport failed: {0}")]
    Transport(String),
}
