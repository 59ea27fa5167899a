use std::{env, str::FromStr, time::Duration};

#[cfg(feature = "sqlite")]
const DEFAULT_DATABASE_URL: &str = "sqlite://feedletter.db?mode=rwc";
#[cfg(feature = "postgres")]
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/feedletter";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// SMTP relay settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application database (default depends on the storage feature)
    pub database_url: String,
    /// Database used for migrations (default: `database_url`)
    pub migration_database_url: Option<String>,
    /// Application pool size (default: 5)
    pub db_max_connections: u32,
    /// Connections kept open when idle (default: 0)
    pub db_min_connections: u32,
    /// Seconds to wait for a pooled connection (default: 30)
    pub db_acquire_timeout_secs: u64,

    /// Feed to turn into campaigns. The poller idles without it.
    pub rss_url: Option<String>,
    /// Blog the subscribe form lives on; target of the success redirect.
    pub site_url: Option<String>,
    /// Public base url of this server, used in confirm/unsubscribe links
    /// (default: "http://localhost:3000")
    pub public_url: String,
    /// Name shown in mails and pages (default: "Newsletter")
    pub newsletter_name: String,
    /// Bearer token for admin endpoints. Admin endpoints are open without it.
    pub admin_token: Option<String>,

    pub smtp: Option<SmtpConfig>,
    /// Sender mailbox (default: "Newsletter <newsletter@localhost>")
    pub mail_from: String,

    pub feed_poll_interval_secs: u64,
    pub feed_poll_initial_delay_secs: u64,
    /// How far back the first poll looks (default: 24)
    pub feed_lookback_hours: i64,

    pub dispatch_interval_secs: u64,
    pub dispatch_initial_delay_secs: u64,
    /// Messages sent per dispatch run (default: 50)
    pub dispatch_batch_size: i64,

    pub migration_max_retries: u32,
    pub migration_retry_interval_secs: u64,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL`, `MIGRATION_DATABASE_URL`
    /// - `DB_MAX_CONNECTIONS` (5), `DB_MIN_CONNECTIONS` (0), `DB_ACQUIRE_TIMEOUT_SECS` (30)
    /// - `RSS_URL`, `SITE_URL`, `PUBLIC_URL`, `NEWSLETTER_NAME`, `ADMIN_TOKEN`
    /// - `SMTP_HOST`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`, `MAIL_FROM`
    /// - `FEED_POLL_INTERVAL_SECS` (900), `FEED_POLL_INITIAL_DELAY_SECS` (60),
    ///   `FEED_LOOKBACK_HOURS` (24)
    /// - `DISPATCH_INTERVAL_SECS` (300), `DISPATCH_INITIAL_DELAY_SECS` (120),
    ///   `DISPATCH_BATCH_SIZE` (50)
    /// - `MIGRATION_MAX_RETRIES` (30), `MIGRATION_RETRY_INTERVAL_SECS` (10)
    /// - `LOG_FORMAT` (`json` for JSON logs)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let smtp = get("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: parsed(get("SMTP_PORT")).unwrap_or(587),
            username: get("SMTP_USERNAME"),
            password: get("SMTP_PASSWORD"),
        });

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            migration_database_url: get("MIGRATION_DATABASE_URL"),
            db_max_connections: parsed(get("DB_MAX_CONNECTIONS")).unwrap_or(5),
            db_min_connections: parsed(get("DB_MIN_CONNECTIONS")).unwrap_or(0),
            db_acquire_timeout_secs: parsed(get("DB_ACQUIRE_TIMEOUT_SECS")).unwrap_or(30),
            rss_url: get("RSS_URL"),
            site_url: get("SITE_URL"),
            public_url: get("PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            newsletter_name: get("NEWSLETTER_NAME").unwrap_or_else(|| "Newsletter".to_string()),
            admin_token: get("ADMIN_TOKEN"),
            smtp,
            mail_from: get("MAIL_FROM")
                .unwrap_or_else(|| "Newsletter <newsletter@localhost>".to_string()),
            feed_poll_interval_secs: parsed(get("FEED_POLL_INTERVAL_SECS")).unwrap_or(900),
            feed_poll_initial_delay_secs: parsed(get("FEED_POLL_INITIAL_DELAY_SECS")).unwrap_or(60),
            feed_lookback_hours: parsed(get("FEED_LOOKBACK_HOURS")).unwrap_or(24),
            dispatch_interval_secs: parsed(get("DISPATCH_INTERVAL_SECS")).unwrap_or(300),
            dispatch_initial_delay_secs: parsed(get("DISPATCH_INITIAL_DELAY_SECS")).unwrap_or(120),
            dispatch_batch_size: parsed(get("DISPATCH_BATCH_SIZE")).unwrap_or(50).max(1),
            migration_max_retries: parsed(get("MIGRATION_MAX_RETRIES")).unwrap_or(30),
            migration_retry_interval_secs: parsed(get("MIGRATION_RETRY_INTERVAL_SECS"))
                .unwrap_or(10),
            log_format,
        }
    }

    /// Url migrations run against.
    pub fn migration_url(&self) -> &str {
        self.migration_database_url
            .as_deref()
            .unwrap_or(&self.database_url)
    }

    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn feed_poll_interval(&self) -> Duration {
        Duration::from_secs(self.feed_poll_interval_secs)
    }

    pub fn feed_poll_initial_delay(&self) -> Duration {
        Duration::from_secs(self.feed_poll_initial_delay_secs)
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs)
    }

    pub fn dispatch_initial_delay(&self) -> Duration {
        Duration::from_secs(self.dispatch_initial_delay_secs)
    }

    pub fn migration_retry_interval(&self) -> Duration {
        Duration::from_secs(self.migration_retry_interval_secs)
    }
}

fn parsed<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|value| value.parse().ok())
}

impl Default for Config {
    /// Every setting at its default, ignoring the environment.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
