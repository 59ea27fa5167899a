mod error;
mod operations;
mod types;

pub use error::CampaignError;
pub use operations::{campaign_outcome, post_subject, SUBJECT_PREFIX};
pub use types::{Campaign, CampaignStatus, NewCampaign};
