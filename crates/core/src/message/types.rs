use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageError;
use crate::subscriber::SubscriberStatus;

/// Delivery state of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Sent,
    Failed,
}

impl MessageStatus {
    /// Returns the string stored in the database for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(MessageStatus::Queued),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            other => Err(MessageError::UnknownStatus(other.to_string())),
        }
    }
}

/// One campaign addressed to one subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub campaign_id: i64,
    pub subscriber_id: i64,
    pub status: MessageStatus,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A queued message joined with everything needed to deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub id: i64,
    pub campaign_id: i64,
    pub subscriber_id: i64,
    pub email: String,
    pub subscriber_status: SubscriberStatus,
    pub subject: String,
    pub html: String,
}

/// Per-status message totals for one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub queued: i64,
    pub sent: i64,
    pub failed: i64,
}

impl MessageCounts {
    /// Total number of messages in any state.
    pub fn total(&self) -> i64 {
        self.queued + self.sent + self.failed
    }
}
