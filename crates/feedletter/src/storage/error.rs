//! sqlx error mapping.
//!
//! Maps `sqlx::Error` to `RepositoryError` from `feedletter_core::storage`.
//! Constraint violations become semantic variants.

use feedletter_core::storage::RepositoryError;

/// Maps a sqlx error to a RepositoryError.
///
/// # Error Mapping
///
/// - Unique constraint -> `RepositoryError::AlreadyExists`
/// - Foreign key constraint -> `RepositoryError::InvalidData`
/// - No rows -> `RepositoryError::NotFound`
/// - Pool and I/O errors -> `RepositoryError::ConnectionFailed`
/// - Decode errors -> `RepositoryError::InvalidData`
/// - All other errors -> `RepositoryError::QueryFailed`
pub fn map_sqlx_error(err: sqlx::Error, entity_type: &'static str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyExists {
                entity_type,
                id: "unknown".to_string(),
            }
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::InvalidData(format!(
                "Foreign key constraint violation for {entity_type}"
            ))
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound {
            entity_type,
            id: "unknown".to_string(),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => RepositoryError::ConnectionFailed(err.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => RepositoryError::InvalidData(err.to_string()),
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}
