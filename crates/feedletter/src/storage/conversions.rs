//! Row types and their conversion into domain types.
//!
//! Status columns are stored as text and parsed here, so a row with an
//! unknown status surfaces as `RepositoryError::InvalidData`.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use feedletter_core::campaign::{Campaign, CampaignStatus};
use feedletter_core::message::{MessageCounts, MessageStatus, QueuedMessage};
use feedletter_core::storage::RepositoryError;
use feedletter_core::subscriber::Subscriber;

#[derive(Debug, FromRow)]
pub struct SubscriberRow {
    pub id: i64,
    pub email: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        Ok(Subscriber {
            id: row.id,
            email: row.email,
            status: row.status.parse().map_err(invalid_data)?,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            unsubscribed_at: row.unsubscribed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub source: String,
    pub subject: String,
    pub html: String,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = RepositoryError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id,
            source: row.source,
            subject: row.subject,
            html: row.html,
            status: row.status.parse().map_err(invalid_data)?,
            scheduled_at: row.scheduled_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub struct QueuedMessageRow {
    pub id: i64,
    pub campaign_id: i64,
    pub subscriber_id: i64,
    pub email: String,
    pub subscriber_status: String,
    pub subject: String,
    pub html: String,
}

impl TryFrom<QueuedMessageRow> for QueuedMessage {
    type Error = RepositoryError;

    fn try_from(row: QueuedMessageRow) -> Result<Self, Self::Error> {
        Ok(QueuedMessage {
            id: row.id,
            campaign_id: row.campaign_id,
            subscriber_id: row.subscriber_id,
            email: row.email,
            subscriber_status: row.subscriber_status.parse().map_err(invalid_data)?,
            subject: row.subject,
            html: row.html,
        })
    }
}

/// Folds `(status, count)` rows into per-status totals.
pub fn counts_from_rows(rows: Vec<(String, i64)>) -> Result<MessageCounts, RepositoryError> {
    rows.into_iter()
        .try_fold(MessageCounts::default(), |mut counts, (status, count)| {
            match status.parse::<MessageStatus>().map_err(invalid_data)? {
                MessageStatus::Queued => counts.queued += count,
                MessageStatus::Sent => counts.sent += count,
                MessageStatus::Failed => counts.failed += count,
            }
            Ok(counts)
        })
}

/// Parses `(id, status)` rows of campaigns.
pub fn campaign_statuses_from_rows(
    rows: Vec<(i64, String)>,
) -> Result<Vec<(i64, CampaignStatus)>, RepositoryError> {
    rows.into_iter()
        .map(|(id, status)| Ok((id, status.parse().map_err(invalid_data)?)))
        .collect()
}

fn invalid_data(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::InvalidData(err.to_string())
}
