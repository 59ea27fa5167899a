//! sqlx repository implementation.
//!
//! Implements the repository traits from `feedletter_core::storage` on top of
//! the pool of the active backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use feedletter_core::campaign::{Campaign, CampaignStatus, NewCampaign};
use feedletter_core::message::{MessageCounts, QueuedMessage};
use feedletter_core::storage::{
    CampaignRepository, DatabaseHealth, MessageRepository, PoolStats, Result,
    SubscriberRepository,
};
use feedletter_core::subscriber::Subscriber;

use super::conversions::{
        campaign_statuses_from_rows, counts_from_rows, CampaignRow, QueuedMessageRow, SubscriberRow,
};
use super::{map_sqlx_error, queries, DbPool};

/// Repository backed by a sqlx connection pool.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct SqlRepository {
    pool: DbPool,
}

impl SqlRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// SubscriberRepository implementation
// ============================================================================

#[async_trait]
impl SubscriberRepository for SqlRepository {
    async fn insert_pending(&self, email: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(queries::INSERT_PENDING_SUBSCRIBER)
            .bind(email)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn activate(&self, email: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(queries::ACTIVATE_SUBSCRIBER)
            .bind(now)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, email: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(queries::DEACTIVATE_SUBSCRIBER)
            .bind(now)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let rows = sqlx::query_as::<_, SubscriberRow>(queries::SELECT_SUBSCRIBERS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        rows.into_iter().map(Subscriber::try_from).collect()
    }

    async fn active_subscriber_ids(&self) -> Result<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(queries::SELECT_ACTIVE_SUBSCRIBER_IDS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))
    }

    async fn delete_subscriber(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(queries::DELETE_SUBSCRIBER_BY_ID)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_subscriber_by_email(&self, email: &str) -> Result<bool> {
        let result = sqlx::query(queries::DELETE_SUBSCRIBER_BY_EMAIL)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Subscriber"))?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// CampaignRepository implementation
// ============================================================================

#[async_trait]
impl CampaignRepository for SqlRepository {
    async fn upsert_campaign(&self, campaign: &NewCampaign, now: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(queries::UPSERT_CAMPAIGN)
            .bind(&campaign.source)
            .bind(&campaign.subject)
            .bind(&campaign.html)
            .bind(campaign.scheduled_at)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Campaign"))
    }

    async fn find_campaign_id_by_source(&self, source: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(queries::SELECT_CAMPAIGN_ID_BY_SOURCE)
            .bind(source)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Campaign"))
    }

    async fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let row = sqlx::query_as::<_, CampaignRow>(queries::SELECT_CAMPAIGN_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Campaign"))?;

        row.map(Campaign::try_from).transpose()
    }

    async fn update_campaign_status(&self, id: i64, status: CampaignStatus) -> Result<()> {
        sqlx::query(queries::UPDATE_CAMPAIGN_STATUS)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Campaign"))?;

        Ok(())
    }

    async fn unsettled_campaigns(&self) -> Result<Vec<(i64, CampaignStatus)>> {
        let rows = sqlx::query_as::<_, (i64, String)>(queries::SELECT_UNSETTLED_CAMPAIGNS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Campaign"))?;

        campaign_statuses_from_rows(rows)
    }
}

// ============================================================================
// MessageRepository implementation
// ============================================================================

#[async_trait]
impl MessageRepository for SqlRepository {
    async fn enqueue_message(
        &self,
        campaign_id: i64,
        subscriber_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(queries::INSERT_QUEUED_MESSAGE)
            .bind(campaign_id)
            .bind(subscriber_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Message"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn queued_messages(&self, limit: i64) -> Result<Vec<QueuedMessage>> {
        let rows = sqlx::query_as::<_, QueuedMessageRow>(queries::SELECT_QUEUED_MESSAGES)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Message"))?;

        rows.into_iter().map(QueuedMessage::try_from).collect()
    }

    async fn mark_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(queries::MARK_MESSAGE_SENT)
            .bind(sent_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Message"))?;

        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        sqlx::query(queries::MARK_MESSAGE_FAILED)
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Message"))?;

        Ok(())
    }

    async fn message_counts(&self, campaign_id: i64) -> Result<MessageCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(queries::COUNT_MESSAGES_BY_STATUS)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Message"))?;

        counts_from_rows(rows)
    }
}

#[async_trait]
impl DatabaseHealth for SqlRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query(queries::PING)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Database"))?;

        Ok(())
    }

    fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use chrono::Duration;
    use feedletter_core::storage::RepositoryError;
    use feedletter_core::subscriber::SubscriberStatus;

    use super::*;
    use crate::storage::memory_pool;

    async fn repository() -> SqlRepository {
        SqlRepository::new(memory_pool().await)
    }

    async fn active_subscriber(repo: &SqlRepository, email: &str) -> i64 {
        repo.insert_pending(email, Utc::now()).await.unwrap();
        repo.activate(email, Utc::now()).await.unwrap();
        repo.list_subscribers()
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.email == email)
            .map(|s| s.id)
            .unwrap()
    }

    fn new_campaign(source: &str) -> NewCampaign {
        NewCampaign::new(source, "New post: Hello", "<p>Hello</p>", Utc::now()).unwrap()
    }

    async fn campaign(repo: &SqlRepository, source: &str) -> i64 {
        repo.upsert_campaign(&new_campaign(source), Utc::now())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_pending_is_idempotent() {
        let repo = repository().await;

        assert!(repo.insert_pending("reader@example.com", Utc::now()).await.unwrap());
        assert!(!repo.insert_pending("reader@example.com", Utc::now()).await.unwrap());

        let subscribers = repo.list_subscribers().await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].status, SubscriberStatus::Pending);
        assert!(subscribers[0].confirmed_at.is_none());
    }

    #[tokio::test]
    async fn test_insert_pending_keeps_existing_status() {
        let repo = repository().await;
        active_subscriber(&repo, "reader@example.com").await;

        repo.insert_pending("reader@example.com", Utc::now()).await.unwrap();

        let subscribers = repo.list_subscribers().await.unwrap();
        assert_eq!(subscribers[0].status, SubscriberStatus::Active);
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let repo = repository().await;
        repo.insert_pending("reader@example.com", Utc::now()).await.unwrap();

        assert!(repo.activate("reader@example.com", Utc::now()).await.unwrap());
        let subscriber = repo.list_subscribers().await.unwrap().remove(0);
        assert_eq!(subscriber.status, SubscriberStatus::Active);
        assert!(subscriber.confirmed_at.is_some());
        assert_eq!(repo.active_subscriber_ids().await.unwrap(), vec![subscriber.id]);

        assert!(repo.deactivate("reader@example.com", Utc::now()).await.unwrap());
        let subscriber = repo.list_subscribers().await.unwrap().remove(0);
        assert_eq!(subscriber.status, SubscriberStatus::Unsubscribed);
        assert!(subscriber.unsubscribed_at.is_some());
        assert!(repo.active_subscriber_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_unknown_email() {
        let repo = repository().await;
        assert!(!repo.activate("nobody@example.com", Utc::now()).await.unwrap());
        assert!(!repo.deactivate("nobody@example.com", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_subscribers_newest_first() {
        let repo = repository().await;
        repo.insert_pending("first@example.com", Utc::now()).await.unwrap();
        repo.insert_pending("second@example.com", Utc::now()).await.unwrap();

        let emails: Vec<String> = repo
            .list_subscribers()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.email)
            .collect();

        assert_eq!(emails, vec!["second@example.com", "first@example.com"]);
    }

    #[tokio::test]
    async fn test_delete_subscriber_by_id_and_email() {
        let repo = repository().await;
        let id = active_subscriber(&repo, "first@example.com").await;
        active_subscriber(&repo, "second@example.com").await;

        assert!(repo.delete_subscriber(id).await.unwrap());
        assert!(!repo.delete_subscriber(id).await.unwrap());
        assert!(repo
            .delete_subscriber_by_email("second@example.com")
            .await
            .unwrap());
        assert!(!repo
            .delete_subscriber_by_email("second@example.com")
            .await
            .unwrap());
        assert!(repo.list_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_campaign_returns_same_id() {
        let repo = repository().await;
        let source = "https://blog.example.com/posts/1";

        let first = campaign(&repo, source).await;

        let mut updated = new_campaign(source);
        updated.subject = "New post: Hello again".to_string();
        updated.html = "<p>edited</p>".to_string();
        let second = repo.upsert_campaign(&updated, Utc::now()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.find_campaign_id_by_source(source).await.unwrap(), Some(first));

        let stored = repo.get_campaign(first).await.unwrap().unwrap();
        let original = new_campaign(source);
        assert_eq!(stored.subject, original.subject);
        assert_eq!(stored.html, original.html);
        assert_eq!(stored.status, CampaignStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_find_unknown_campaign() {
        let repo = repository().await;
        assert_eq!(
            repo.find_campaign_id_by_source("https://nowhere").await.unwrap(),
            None
        );
        assert_eq!(repo.get_campaign(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_campaign_status() {
        let repo = repository().await;
        let first = campaign(&repo, "https://a").await;
        let second = campaign(&repo, "https://b").await;

        repo.update_campaign_status(first, CampaignStatus::Sent).await.unwrap();

        assert_eq!(
            repo.unsettled_campaigns().await.unwrap(),
            vec![(second, CampaignStatus::Scheduled)]
        );
        let stored = repo.get_campaign(first).await.unwrap().unwrap();
        assert_eq!(stored.status, CampaignStatus::Sent);
    }

    #[tokio::test]
    async fn test_settled_campaign_with_queued_message_is_unsettled() {
        let repo = repository().await;
        let subscriber_id = active_subscriber(&repo, "reader@example.com").await;
        let campaign_id = campaign(&repo, "https://a").await;
        repo.update_campaign_status(campaign_id, CampaignStatus::Sent).await.unwrap();
        assert!(repo.unsettled_campaigns().await.unwrap().is_empty());

        repo.enqueue_message(campaign_id, subscriber_id, Utc::now()).await.unwrap();

        assert_eq!(
            repo.unsettled_campaigns().await.unwrap(),
            vec![(campaign_id, CampaignStatus::Sent)]
        );
    }

    #[tokio::test]
    async fn test_enqueue_message_is_unique_per_pair() {
        let repo = repository().await;
        let subscriber_id = active_subscriber(&repo, "reader@example.com").await;
        let campaign_id = campaign(&repo, "https://a").await;

        assert!(repo.enqueue_message(campaign_id, subscriber_id, Utc::now()).await.unwrap());
        assert!(!repo.enqueue_message(campaign_id, subscriber_id, Utc::now()).await.unwrap());

        let counts = repo.message_counts(campaign_id).await.unwrap();
        assert_eq!(counts.queued, 1);
        assert_eq!(counts.total(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_for_missing_campaign_is_invalid_data() {
        let repo = repository().await;
        let subscriber_id = active_subscriber(&repo, "reader@example.com").await;

        let result = repo.enqueue_message(42, subscriber_id, Utc::now()).await;

        assert!(matches!(result, Err(RepositoryError::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_queued_messages_join_and_limit() {
        let repo = repository().await;
        let first = active_subscriber(&repo, "first@example.com").await;
        let second = active_subscriber(&repo, "second@example.com").await;
        let campaign_id = campaign(&repo, "https://a").await;
        repo.enqueue_message(campaign_id, first, Utc::now()).await.unwrap();
        repo.enqueue_message(campaign_id, second, Utc::now()).await.unwrap();

        let batch = repo.queued_messages(1).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].subscriber_id, first);
        assert_eq!(batch[0].email, "first@example.com");
        assert_eq!(batch[0].subscriber_status, SubscriberStatus::Active);
        assert_eq!(batch[0].subject, "New post: Hello");
        assert_eq!(batch[0].html, "<p>Hello</p>");
        assert_eq!(repo.queued_messages(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mark_sent_and_failed() {
        let repo = repository().await;
        let first = active_subscriber(&repo, "first@example.com").await;
        let second = active_subscriber(&repo, "second@example.com").await;
        let campaign_id = campaign(&repo, "https://a").await;
        repo.enqueue_message(campaign_id, first, Utc::now()).await.unwrap();
        repo.enqueue_message(campaign_id, second, Utc::now()).await.unwrap();
        let batch = repo.queued_messages(10).await.unwrap();

        repo.mark_sent(batch[0].id, Utc::now()).await.unwrap();
        repo.mark_failed(batch[1].id, "mailbox full").await.unwrap();

        assert!(repo.queued_messages(10).await.unwrap().is_empty());
        let counts = repo.message_counts(campaign_id).await.unwrap();
        assert_eq!(
            counts,
            MessageCounts {
                queued: 0,
                sent: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_deleting_subscriber_deletes_messages() {
        let repo = repository().await;
        let subscriber_id = active_subscriber(&repo, "reader@example.com").await;
        let campaign_id = campaign(&repo, "https://a").await;
        repo.enqueue_message(campaign_id, subscriber_id, Utc::now()).await.unwrap();

        repo.delete_subscriber(subscriber_id).await.unwrap();

        assert_eq!(repo.message_counts(campaign_id).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_timestamps_round_trip() {
        let repo = repository().await;
        let scheduled_at = Utc::now() - Duration::hours(2);
        let new = NewCampaign::new("https://a", "New post: A", "<p>A</p>", scheduled_at).unwrap();

        let id = repo.upsert_campaign(&new, Utc::now()).await.unwrap();
        let stored = repo.get_campaign(id).await.unwrap().unwrap();

        assert_eq!(stored.scheduled_at, scheduled_at);
    }

    #[tokio::test]
    async fn test_ping_and_pool_stats() {
        let repo = repository().await;
        repo.ping().await.unwrap();

        let stats = repo.pool_stats();
        assert!(stats.size <= 1);
        assert!(stats.idle <= stats.size);
    }
}
