//! SQLite backend: `?` placeholders, timestamps stored as text.

pub mod queries;

use sqlx::migrate::Migrator;

pub type Db = sqlx::Sqlite;

/// Migrations under `migrations/sqlite`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");
