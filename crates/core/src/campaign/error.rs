use thiserror::Error;

/// Errors that can occur when reading or building campaigns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CampaignError {
    #[error("Campaign source cannot be empty")]
    EmptySource,
    #[error("Unknown campaign status: {0}")]
    UnknownStatus(String),
}
