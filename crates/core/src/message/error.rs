use thiserror::Error;

/// Errors that can occur when reading messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Unknown message status: {0}")]
    UnknownStatus(String),
}
