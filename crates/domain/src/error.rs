//! Domain error types.

use common::{BucketId, ItemId};
use thiserror::Error;

use crate::bucket::BucketError;
use crate::query::QueryError;
use crate::repository::RepositoryError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the repository.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A bucket invariant was violated.
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),

    /// A filter or sort order could not be built.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Bucket not found.
    #[error("Bucket not found: {0}")]
    BucketNotFound(BucketId),

    /// Item not found in the bucket.
    #[error("Item {item_id} not found in bucket {bucket_id}")]
    ItemNotFound { bucket_id: BucketId, item_id: ItemId },
}
