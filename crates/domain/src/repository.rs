//! Persistence seam for the bucket aggregate.

use async_trait::async_trait;
use common::{BucketId, Version};
use thiserror::Error;

use crate::bucket::Bucket;
use crate::query::{SortOrder, Specification};

/// Errors reported by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No bucket with this ID is stored.
    #[error("Bucket not found: {0}")]
    NotFound(BucketId),

    /// A bucket with this ID is already stored.
    #[error("Bucket already exists: {0}")]
    AlreadyExists(BucketId),

    /// The stored version did not match the version being written.
    #[error("Concurrency conflict for bucket {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        id: BucketId,
        expected: Version,
        actual: Version,
    },

    /// A transient bucket was passed where a persisted one is required.
    #[error("Bucket has no identity; add it before updating or removing it")]
    MissingIdentity,

    /// The query uses a property or value the backend cannot translate.
    #[error("Unsupported query: {0}")]
    Unsupported(String),

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Filter, pagination and ordering for a bucket lookup.
#[derive(Debug, Clone)]
pub struct BucketQuery {
    /// Buckets must satisfy this specification.
    pub specification: Specification<Bucket>,

    /// Maximum number of buckets to return.
    pub limit: Option<usize>,

    /// Number of buckets to skip.
    pub offset: Option<usize>,

    /// Ordering applied before pagination.
    pub sort: Option<SortOrder<Bucket>>,
}

impl Default for BucketQuery {
    fn default() -> Self {
        Self::all()
    }
}

impl BucketQuery {
    /// Creates a query for buckets matching a specification.
    pub fn new(specification: Specification<Bucket>) -> Self {
        Self {
            specification,
            limit: None,
            offset: None,
            sort: None,
        }
    }

    /// Creates a query matching every bucket.
    pub fn all() -> Self {
        Self::new(Specification::matches_all())
    }

    /// Limits the number of buckets returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many buckets before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Orders the results.
    pub fn sort(mut self, sort: SortOrder<Bucket>) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Evaluates the query in process: filter, stable sort, offset, limit.
    ///
    /// Buckets keep their input order when no sort is given or keys tie.
    pub fn apply<I>(&self, buckets: I) -> Vec<Bucket>
    where
        I: IntoIterator<Item = Bucket>,
    {
        let mut matched: Vec<Bucket> = buckets
            .into_iter()
            .filter(|b| self.specification.is_satisfied_by(b))
            .collect();

        if let Some(sort) = &self.sort {
            sort.sort(&mut matched);
        }

        matched
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Storage for whole bucket aggregates, items included.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BucketRepository: Send + Sync {
    /// Loads one bucket with its items.
    ///
    /// Returns None if no bucket has this ID.
    async fn get(&self, id: BucketId) -> RepositoryResult<Option<Bucket>>;

    /// Loads the buckets matching a query, each with its items.
    async fn find(&self, query: &BucketQuery) -> RepositoryResult<Vec<Bucket>>;

    /// Stores a new bucket.
    ///
    /// A transient bucket is given a fresh ID. The returned bucket carries its
    /// ID and the first version.
    async fn add(&self, bucket: Bucket) -> RepositoryResult<Bucket>;

    /// Replaces a stored bucket and its items.
    ///
    /// Fails with `ConcurrencyConflict` if the stored version differs from
    /// `bucket.version()`. The returned bucket carries the next version.
    async fn update(&self, bucket: Bucket) -> RepositoryResult<Bucket>;

    /// Deletes a stored bucket and all of its items.
    async fn remove(&self, bucket: &Bucket) -> RepositoryResult<()>;
}

/// Extension trait providing convenience methods for repositories.
#[async_trait]
pub trait BucketRepositoryExt: BucketRepository {
    /// Checks whether a bucket is stored.
    async fn exists(&self, id: BucketId) -> RepositoryResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Loads a bucket, failing with `NotFound` if it is absent.
    async fn get_required(&self, id: BucketId) -> RepositoryResult<Bucket> {
        self.get(id).await?.ok_or(RepositoryError::NotFound(id))
    }

    /// Counts the buckets matching a specification.
    async fn count(&self, specification: &Specification<Bucket>) -> RepositoryResult<usize> {
        let query = BucketQuery::new(specification.clone());
        Ok(self.find(&query).await?.len())
    }
}

// Blanket implementation for all BucketRepository implementations
impl<T: BucketRepository + ?Sized> BucketRepositoryExt for T {}

/// Returns the ID of a persisted bucket, or `MissingIdentity`.
pub fn require_id(bucket: &Bucket) -> RepositoryResult<BucketId> {
    bucket.id().ok_or(RepositoryError::MissingIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::{Item, specs};

    fn bucket(name: &str, size: u32, count: usize) -> Bucket {
        let mut bucket = Bucket::with_size(size).with_name(name);
        for _ in 0..count {
            bucket.add_item(Item::new(None, None)).unwrap();
        }
        bucket
    }

    fn names(buckets: &[Bucket]) -> Vec<&str> {
        buckets.iter().filter_map(Bucket::name).collect()
    }

    #[test]
    fn apply_filters_sorts_and_paginates() {
        let buckets = vec![
            bucket("a", 5, 0),
            bucket("b", 3, 3),
            bucket("c", 4, 1),
            bucket("d", 2, 0),
        ];
        let query = BucketQuery::new(specs::is_full().not())
            .sort(SortOrder::order_by(Bucket::SIZE).unwrap())
            .offset(1)
            .limit(1);

        assert_eq!(names(&query.apply(buckets)), vec!["c"]);
    }

    #[test]
    fn apply_without_sort_keeps_input_order() {
        let buckets = vec![bucket("x", 1, 0), bucket("y", 1, 0), bucket("z", 1, 0)];
        assert_eq!(names(&BucketQuery::all().apply(buckets)), vec!["x", "y", "z"]);
    }

    #[test]
    fn require_id_rejects_transient_bucket() {
        assert!(matches!(
            require_id(&Bucket::new()),
            Err(RepositoryError::MissingIdentity)
        ));
    }
}
