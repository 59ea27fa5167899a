use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CampaignError;

/// Delivery state of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Messages are queued or still being sent.
    Scheduled,
    /// Every message has been processed and at least one was delivered.
    Sent,
    /// Every message has been processed and none was delivered.
    Failed,
}

impl CampaignStatus {
    /// Returns the string stored in the database for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Sent => "sent",
            CampaignStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "sent" => Ok(CampaignStatus::Sent),
            "failed" => Ok(CampaignStatus::Failed),
            other => Err(CampaignError::UnknownStatus(other.to_string())),
        }
    }
}

/// One newsletter issue, created from one feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    /// Link of the feed entry this campaign announces. Unique.
    pub source: String,
    pub subject: String,
    /// Email body; contains the unsubscribe placeholder.
    pub html: String,
    pub status: CampaignStatus,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Data needed to create a campaign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCampaign {
    pub source: String,
    pub subject: String,
    pub html: String,
    pub scheduled_at: DateTime<Utc>,
}

impl NewCampaign {
    /// Creates a campaign scheduled for `scheduled_at`.
    ///
    /// Fails when `source` is blank, since it is the idempotency key.
    pub fn new(
        source: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Self, CampaignError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(CampaignError::EmptySource);
        }

        Ok(Self {
            source,
            subject: subject.into(),
            html: html.into(),
            scheduled_at,
        })
    }
}
