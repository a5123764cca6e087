use common::BucketId;
use domain::RepositoryError;
use thiserror::Error;

/// Errors raised by the storage backends themselves.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row does not describe a valid bucket.
    #[error("Invalid stored bucket {id}: {reason}")]
    InvalidRow { id: BucketId, reason: String },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}
