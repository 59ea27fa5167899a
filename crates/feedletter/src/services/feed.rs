//! Turns new feed entries into campaigns.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};

use feedletter_core::campaign::{post_subject, NewCampaign};
use feedletter_core::feed::{is_new_entry, FeedEntry};

use super::{campaigns, dispatch};
use crate::mail::templates;
use crate::state::AppState;

/// Polls the configured feed and remembers when it last did so.
pub struct FeedPoller {
    state: AppState,
    last_polled: DateTime<Utc>,
}

impl FeedPoller {
    /// Starts looking back `FEED_LOOKBACK_HOURS` from now.
    ///
    /// A lookback too large to represent starts from the earliest
    /// representable time, so every dated entry is new.
    pub fn new(state: AppState) -> Self {
        let now = Utc::now();
        let last_polled = Duration::try_hours(state.config.feed_lookback_hours)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { state, last_polled }
    }

    pub fn last_polled(&self) -> DateTime<Utc> {
        self.last_polled
    }

    /// Fetches the feed once and creates a campaign for every new entry.
    ///
    /// Returns how many campaigns were created or found. `last_polled` only
    /// moves forward when the fetch succeeds.
    pub async fn poll(&mut self) -> usize {
        let Some(rss_url) = self.state.config.rss_url.clone() else {
            tracing::debug!("RSS_URL is not set, skipping feed poll");
            return 0;
        };

        let started = Utc::now();

        let entries = match self.state.feed.fetch(&rss_url).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::error!(url = %rss_url, error = %err, "Failed to fetch feed");
                return 0;
            }
        };

        let new_entries: Vec<FeedEntry> = entries
            .into_iter()
            .filter(|entry| is_new_entry(entry, self.last_polled))
            .collect();

        tracing::info!(
            url = %rss_url,
            new_entries = new_entries.len(),
            since = %self.last_polled,
            "Feed polled"
        );

        let mut scheduled = 0;
        for entry in &new_entries {
            match self.publish(entry).await {
                Ok(campaign_id) => {
                    tracing::info!(campaign_id, link = %entry.link, "Campaign scheduled");
                    scheduled += 1;
                }
                Err(err) => {
                    tracing::warn!(link = %entry.link, error = %err, "Failed to schedule campaign");
                }
            }
        }

        self.last_polled = started;
        scheduled
    }

    async fn publish(&self, entry: &FeedEntry) -> anyhow::Result<i64> {
        let html = templates::new_post_html(entry, &self.state.config.newsletter_name)
            .context("Failed to render campaign body")?;
        let campaign = NewCampaign::new(&entry.link, post_subject(&entry.title), html, Utc::now())?;

        let campaign_id = campaigns::create_campaign(self.state.campaigns.as_ref(), &campaign).await?;
        dispatch::queue_messages_for_campaign(&self.state, campaign_id).await?;

        Ok(campaign_id)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use feedletter_core::message::UNSUBSCRIBE_PLACEHOLDER;

    use super::*;
    use crate::config::Config;
    use crate::state::test_support::{RecordingMailer, StaticFeedSource, TestContext};

    fn config_with_feed() -> Config {
        Config {
            rss_url: Some("https://blog.example.com/rss.xml".to_string()),
            ..Config::default()
        }
    }

    fn entry(link: &str, age: Duration) -> FeedEntry {
        FeedEntry {
            title: format!("Post {link}"),
            link: link.to_string(),
            description: Some("<p>Summary</p>".to_string()),
            published: Some(Utc::now() - age),
        }
    }

    async fn context(entries: Vec<FeedEntry>) -> TestContext {
        TestContext::with_fakes(
            config_with_feed(),
            RecordingMailer::default(),
            StaticFeedSource::with_entries(entries),
        )
        .await
    }

    async fn add_active(state: &AppState, email: &str) {
        state.subscribers.insert_pending(email, Utc::now()).await.unwrap();
        state.subscribers.activate(email, Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_entries_become_campaigns() {
        let ctx = context(vec![
            entry("https://blog.example.com/new", Duration::hours(1)),
            entry("https://blog.example.com/old", Duration::hours(48)),
        ])
        .await;
        add_active(&ctx.state, "reader@example.com").await;
        let mut poller = FeedPoller::new(ctx.state.clone());

        assert_eq!(poller.poll().await, 1);

        let campaign_id = ctx
            .state
            .campaigns
            .find_campaign_id_by_source("https://blog.example.com/new")
            .await
            .unwrap()
            .unwrap();
        let campaign = ctx.state.campaigns.get_campaign(campaign_id).await.unwrap().unwrap();
        assert_eq!(campaign.subject, "New post: Post https://blog.example.com/new");
        assert!(campaign.html.contains(UNSUBSCRIBE_PLACEHOLDER));
        assert!(ctx
            .state
            .campaigns
            .find_campaign_id_by_source("https://blog.example.com/old")
            .await
            .unwrap()
            .is_none());

        let counts = ctx.state.messages.message_counts(campaign_id).await.unwrap();
        assert_eq!(counts.queued, 1);
    }

    #[tokio::test]
    async fn test_second_poll_skips_seen_entries() {
        let ctx = context(vec![entry("https://blog.example.com/new", Duration::hours(1))]).await;
        let mut poller = FeedPoller::new(ctx.state.clone());

        assert_eq!(poller.poll().await, 1);
        assert_eq!(poller.poll().await, 0);
        assert_eq!(ctx.feed.fetches(), 2);
    }

    #[tokio::test]
    async fn test_poll_advances_last_polled() {
        let ctx = context(Vec::new()).await;
        let mut poller = FeedPoller::new(ctx.state.clone());
        let initial = poller.last_polled();
        assert!(initial <= Utc::now() - Duration::hours(24));

        let before = Utc::now();
        poller.poll().await;

        assert!(poller.last_polled() >= before);
    }

    #[tokio::test]
    async fn test_huge_lookback_starts_from_earliest_time() {
        for hours in [i64::MAX, 3_000_000_000] {
            let config = Config {
                feed_lookback_hours: hours,
                ..config_with_feed()
            };
            let ctx = TestContext::new(config).await;

            let poller = FeedPoller::new(ctx.state.clone());

            assert_eq!(poller.last_polled(), DateTime::<Utc>::MIN_UTC);
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_last_polled() {
        let ctx = TestContext::with_fakes(
            config_with_feed(),
            RecordingMailer::default(),
            StaticFeedSource::failing(),
        )
        .await;
        let mut poller = FeedPoller::new(ctx.state.clone());
        let initial = poller.last_polled();

        assert_eq!(poller.poll().await, 0);
        assert_eq!(poller.last_polled(), initial);
    }

    #[tokio::test]
    async fn test_without_rss_url_nothing_is_fetched() {
        let ctx = TestContext::with_fakes(
            Config::default(),
            RecordingMailer::default(),
            StaticFeedSource::with_entries(vec![entry("https://x", Duration::hours(1))]),
        )
        .await;
        let mut poller = FeedPoller::new(ctx.state.clone());

        assert_eq!(poller.poll().await, 0);
        assert_eq!(ctx.feed.fetches(), 0);
    }

    #[tokio::test]
    async fn test_repeated_entry_reuses_campaign() {
        let ctx = context(vec![entry("https://blog.example.com/new", Duration::minutes(5))]).await;
        add_active(&ctx.state, "reader@example.com").await;

        let mut first = FeedPoller::new(ctx.state.clone());
        let mut second = FeedPoller::new(ctx.state.clone());
        assert_eq!(first.poll().await, 1);
        assert_eq!(second.poll().await, 1);

        let campaign_id = ctx
            .state
            .campaigns
            .find_campaign_id_by_source("https://blog.example.com/new")
            .await
            .unwrap()
            .unwrap();
        let counts = ctx.state.messages.message_counts(campaign_id).await.unwrap();
        assert_eq!(counts.queued, 1);
    }
}
