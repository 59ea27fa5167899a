use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::campaign::{Campaign, CampaignStatus, NewCampaign};
use crate::message::{MessageCounts, QueuedMessage};
use crate::subscriber::Subscriber;

use super::{PoolStats, Result};

/// Repository for subscriber operations.
///
/// Emails passed in are expected to be normalized already.
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Inserts a pending subscriber. Returns `false` when the email already exists.
    async fn insert_pending(&self, email: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Marks the subscriber active and stamps `confirmed_at`.
    /// Returns `false` when no subscriber has this email.
    async fn activate(&self, email: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Marks the subscriber unsubscribed and stamps `unsubscribed_at`.
    /// Returns `false` when no subscriber has this email.
    async fn deactivate(&self, email: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Lists every subscriber, newest first.
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>>;

    /// Ids of subscribers that currently receive mail.
    async fn active_subscriber_ids(&self) -> Result<Vec<i64>>;

    /// Deletes a subscriber by id. Returns `false` when nothing was deleted.
    async fn delete_subscriber(&self, id: i64) -> Result<bool>;

    /// Deletes a subscriber by email. Returns `false` when nothing was deleted.
    async fn delete_subscriber_by_email(&self, email: &str) -> Result<bool>;
}

/// Repository for campaign operations.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Creates the campaign. When one with the same source exists it is left
    /// untouched. Returns the campaign id either way.
    async fn upsert_campaign(&self, campaign: &NewCampaign, now: DateTime<Utc>) -> Result<i64>;

    /// Looks up a campaign id by source.
    async fn find_campaign_id_by_source(&self, source: &str) -> Result<Option<i64>>;

    /// Gets a campaign by id.
    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>>;

    /// Sets the status of a campaign.
    async fn update_campaign_status(&self, id: i64, status: CampaignStatus) -> Result<()>;

    /// Ids and statuses of campaigns that are `scheduled` or still have
    /// queued messages, oldest first.
    async fn unsettled_campaigns(&self) -> Result<Vec<(i64, CampaignStatus)>>;
}

/// Repository for message operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Queues a message for one subscriber. Returns `false` when the pair was
    /// already queued.
    async fn enqueue_message(
        &self,
        campaign_id: i64,
        subscriber_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Up to `limit` queued messages, oldest first, joined with their
    /// subscriber and campaign.
    async fn queued_messages(&self, limit: i64) -> Result<Vec<QueuedMessage>>;

    /// Marks a message sent.
    async fn mark_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<()>;

    /// Marks a message failed, keeping the reason.
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;

    /// Per-status totals for one campaign.
    async fn message_counts(&self, campaign_id: i64) -> Result<MessageCounts>;
}

/// Liveness of the database behind the repositories.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    /// Runs a trivial query.
    async fn ping(&self) -> Result<()>;

    /// Current pool usage.
    fn pool_stats(&self) -> PoolStats;
}
