//! Background schema migrations.
//!
//! Migrations run on their own small pool so a busy application pool cannot
//! starve them. Connection-limit failures are retried; anything else gives up.

use std::time::Duration;

use sqlx::migrate::MigrateError;
use tokio::task::JoinHandle;

use feedletter_core::storage::{DatabaseHealth, PoolStats};

use crate::config::Config;
use crate::state::AppState;
use crate::storage::{DbPoolOptions, MIGRATOR};

/// Postgres transaction-pooler port; migrations need a session connection.
const TRANSACTION_POOLER_PORT: &str = ":6543";
const SESSION_PORT: &str = ":5432";

/// Error code Postgres reports for `too_many_connections`.
const TOO_MANY_CONNECTIONS: &str = "53300";

const CONNECTION_LIMIT_MESSAGES: &[&str] = &[
    "too many clients",
    "max client connections",
    "connection is not available",
    "remaining connection slots",
];

/// Rewrites a Postgres transaction-pooler url to its session-mode port.
///
/// Other urls are returned unchanged.
pub fn session_mode_url(url: &str) -> String {
    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return url.to_string();
    }

    let Some(index) = url.find(TRANSACTION_POOLER_PORT) else {
        return url.to_string();
    };

    let rest = &url[index + TRANSACTION_POOLER_PORT.len()..];
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
        format!("{}{SESSION_PORT}{rest}", &url[..index])
    } else {
        url.to_string()
    }
}

/// Whether a database error means the server or pool ran out of connections.
pub fn is_connection_limit(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(TOO_MANY_CONNECTIONS)
                || mentions_connection_limit(db_err.message())
        }
        other => mentions_connection_limit(&other.to_string()),
    }
}

fn mentions_connection_limit(message: &str) -> bool {
    let message = message.to_lowercase();
    CONNECTION_LIMIT_MESSAGES
        .iter()
        .any(|needle| message.contains(needle))
}

/// Whether a failed migration run is worth retrying.
pub fn is_retryable(err: &MigrateError) -> bool {
    match err {
        MigrateError::Execute(err) | MigrateError::ExecuteMigration(err, _) => {
            is_connection_limit(err)
        }
        _ => false,
    }
}

/// True when every allowed connection of the pool is checked out.
pub fn pool_exhausted(stats: PoolStats, max_connections: u32) -> bool {
    stats.idle == 0 && stats.size >= max_connections
}

fn log_pool_status(database: &dyn DatabaseHealth, max_connections: u32, stage: &str) {
    let stats = database.pool_stats();

    tracing::info!(
        stage,
        size = stats.size,
        idle = stats.idle,
        in_use = stats.active(),
        max = max_connections,
        "Application pool status"
    );

    if pool_exhausted(stats, max_connections) {
        tracing::warn!(stage, "Application pool exhausted, every connection is in use");
    }
}

/// Applies pending migrations, retrying while the database is out of
/// connections. Returns `true` when the schema is up to date.
pub async fn run_migrations(config: &Config, database: &dyn DatabaseHealth) -> bool {
    let url = session_mode_url(config.migration_url());
    let max_attempts = config.migration_max_retries.max(1);
    let retry_interval = config.migration_retry_interval();

    let pool = match DbPoolOptions::new()
        .max_connections(2)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(120))
        .max_lifetime(Duration::from_secs(300))
        .connect_lazy(&url)
    {
        Ok(pool) => pool,
        Err(err) => {
            tracing::error!(error = %err, "Invalid migration database url, migrations skipped");
            return false;
        }
    };

    for attempt in 1..=max_attempts {
        log_pool_status(database, config.db_max_connections, "before migration");

        let result = MIGRATOR.run(&pool).await;

        log_pool_status(database, config.db_max_connections, "after migration");

        match result {
            Ok(()) => {
                tracing::info!(attempt, "Database migrations applied");
                pool.close().await;
                return true;
            }
            Err(err) if is_retryable(&err) && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    retry_in_secs = retry_interval.as_secs(),
                    error = %err,
                    "Migration hit the connection limit, retrying"
                );
                tokio::time::sleep(retry_interval).await;
            }
            Err(err) => {
                tracing::error!(attempt, error = %err, "Database migrations failed");
                break;
            }
        }
    }

    pool.close().await;
    false
}

/// Runs migrations in the background so the server can start serving
/// liveness checks right away.
pub fn spawn_migrations(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        if !run_migrations(&state.config, state.database.as_ref()).await {
            tracing::error!("Giving up on database migrations");
        }
    })
}
