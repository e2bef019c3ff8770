use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Errors surfaced by the store. No retry or recovery happens here;
/// transient-failure handling belongs to the ingestion collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed or out-of-order observation rejected before any write.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness or foreign-key breach reported by PostgreSQL.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Operation addressed a pool with no config row.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Any other database failure, passed through unmodified.
    #[error("database error: {0}")]
    Database(tokio_postgres::Error),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.code() {
            Some(code)
                if *code == SqlState::UNIQUE_VIOLATION
                    || *code == SqlState::FOREIGN_KEY_VIOLATION =>
            {
                let detail = e
                    .as_db_error()
                    .map(|db| db.message().to_string())
                    .unwrap_or_else(|| e.to_string());
                StoreError::ConstraintViolation(detail)
            }
            _ => StoreError::Database(e),
        }
    }
}
