//! Storage backend implementations.
//!
//! A single sqlx repository implements the repository traits defined in
//! `feedletter_core::storage`. The backend is selected at compile time and
//! supplies the SQL dialect and the embedded migrations.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): SQLite database file
//! - `postgres`: PostgreSQL server
//!
//! These features are mutually exclusive.
//!
//! # Examples
//!
//! Build with PostgreSQL:
//! ```bash
//! cargo build -p feedletter --no-default-features --features postgres
//! ```

#[cfg(all(feature = "sqlite", feature = "postgres"))]
compile_error!(
    "Features 'sqlite' and 'postgres' are mutually exclusive. \
    Enable only one storage backend at a time."
);

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!(
    "No storage backend selected. Enable 'sqlite' or 'postgres' feature. \
    Example: cargo build -p feedletter --features postgres"
);

mod conversions;
mod error;
mod repository;

#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(feature = "sqlite")]
use self::sqlite as backend;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
use self::postgres as backend;

use backend::queries;

pub use backend::{Db, MIGRATOR};
pub use error::map_sqlx_error;
pub use repository::SqlRepository;

use crate::config::Config;

/// Connection pool of the active backend.
pub type DbPool = sqlx::Pool<Db>;

/// Pool options of the active backend.
pub type DbPoolOptions = sqlx::pool::PoolOptions<Db>;

/// Creates the application pool. Connections are opened on first use, so the
/// server starts even while the database is unreachable.
pub fn connect_lazy(config: &Config) -> Result<DbPool, sqlx::Error> {
    DbPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(config.db_acquire_timeout())
        .connect_lazy(&config.database_url)
}

/// In-memory database with every migration applied.
#[cfg(all(test, feature = "sqlite"))]
pub async fn memory_pool() -> DbPool {
    let pool = DbPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to apply migrations");

    pool
}
