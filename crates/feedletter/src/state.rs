//! Application state shared by handlers and background jobs.
//!
//! Repositories, the mailer and the feed source are trait objects so tests
//! can swap in fakes.

use std::sync::Arc;

use tokio::sync::broadcast;

use feedletter_core::feed::FeedSource;
use feedletter_core::mail::Mailer;
use feedletter_core::storage::{
    CampaignRepository, DatabaseHealth, MessageRepository, SubscriberRepository,
};

use crate::config::Config;
use crate::feed::HttpFeedSource;
use crate::mail::{LogMailer, SmtpMailer};
use crate::storage::{self, SqlRepository};

/// Shared application state.
///
/// Cloned for each request handler and background job.
#[derive(Clone)]
pub struct AppState {
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub campaigns: Arc<dyn CampaignRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub database: Arc<dyn DatabaseHealth>,
    pub mailer: Arc<dyn Mailer>,
    pub feed: Arc<dyn FeedSource>,
    pub config: Arc<Config>,
    /// Shutdown signal sender for background jobs.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Creates the state from configuration: a lazy database pool, an SMTP
    /// mailer when `SMTP_HOST` is set (a logging mailer otherwise) and the
    /// HTTP feed source.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let pool = storage::connect_lazy(&config)?;

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail_from)?),
            None => {
                tracing::warn!("SMTP_HOST is not set, outgoing mail will only be logged");
                Arc::new(LogMailer)
            }
        };

        let feed = Arc::new(HttpFeedSource::new()?);

        Ok(Self::build(SqlRepository::new(pool), mailer, feed, config))
    }

    /// Creates the state around an existing repository.
    pub fn build(
        repository: SqlRepository,
        mailer: Arc<dyn Mailer>,
        feed: Arc<dyn FeedSource>,
        config: Config,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let repository = Arc::new(repository);

        Self {
            subscribers: repository.clone(),
            campaigns: repository.clone(),
            messages: repository.clone(),
            database: repository,
            mailer,
            feed,
            config: Arc::new(config),
            shutdown_tx,
        }
    }

    /// Subscribe to shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal all background jobs to stop.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

// ============================================================================
// Test support
// ============================================================================

#[cfg(all(test, feature = "sqlite"))]
pub mod test_support {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use feedletter_core::feed::{FeedEntry, FeedError};
    use feedletter_core::mail::{MailError, OutgoingMail};

    use super::*;
    use crate::storage::memory_pool;

    /// Mailer that keeps every mail it is asked to send.
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingMail>>,
        failing: HashSet<String>,
    }

    impl RecordingMailer {
        /// A mailer that rejects mail for the given addresses.
        pub fn failing_for(addresses: &[&str]) -> Self {
            Self {
                sent: Mutex::default(),
                failing: addresses.iter().map(|a| a.to_string()).collect(),
            }
        }

        pub fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
            if self.failing.contains(&mail.to) {
                return Err(MailError::Transport("mailbox unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    /// Feed source returning fixed entries, or failing every fetch.
    #[derive(Default)]
    pub struct StaticFeedSource {
        entries: Vec<FeedEntry>,
        fail: bool,
        fetches: AtomicUsize,
    }

    impl StaticFeedSource {
        pub fn with_entries(entries: Vec<FeedEntry>) -> Self {
            Self {
                entries,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FeedSource for StaticFeedSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<FeedEntry>, FeedError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FeedError::Http("connection refused".to_string()));
            }
            Ok(self.entries.clone())
        }
    }

    /// State over an in-memory database plus handles on its fakes.
    pub struct TestContext {
        pub state: AppState,
        pub mailer: Arc<RecordingMailer>,
        pub feed: Arc<StaticFeedSource>,
    }

    impl TestContext {
        pub async fn new(config: Config) -> Self {
            Self::with_fakes(config, RecordingMailer::default(), StaticFeedSource::default())
                .await
        }

        pub async fn with_fakes(
            config: Config,
            mailer: RecordingMailer,
            feed: StaticFeedSource,
        ) -> Self {
            let mailer = Arc::new(mailer);
            let feed = Arc::new(feed);
            let repository = SqlRepository::new(memory_pool().await);
            let state = AppState::build(repository, mailer.clone(), feed.clone(), config);

            Self {
                state,
                mailer,
                feed,
            }
        }
    }
}
