use common::BucketId;
use domain::{Bucket, BucketQuery, BucketRepository, RepositoryResult};
use tokio::runtime::{Builder, Runtime};

/// Synchronous facade over an async bucket repository.
///
/// Each call drives the inner repository to completion on a private
/// current-thread runtime. Calling these methods from inside an async
/// context panics; use the inner repository there instead.
pub struct BlockingBucketRepository<R> {
    inner: R,
    runtime: Runtime,
}

impl<R: BucketRepository> BlockingBucketRepository<R> {
    /// Wraps a repository with a new current-thread runtime.
    pub fn new(inner: R) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self::with_runtime(inner, runtime))
    }

    /// Wraps a repository with an existing runtime.
    pub fn with_runtime(inner: R, runtime: Runtime) -> Self {
        Self { inner, runtime }
    }

    /// Returns the wrapped repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn get(&self, id: BucketId) -> RepositoryResult<Option<Bucket>> {
        self.runtime.block_on(self.inner.get(id))
    }

    pub fn find(&self, query: &BucketQuery) -> RepositoryResult<Vec<Bucket>> {
        self.runtime.block_on(self.inner.find(query))
    }

    pub fn add(&self, bucket: Bucket) -> RepositoryResult<Bucket> {
        self.runtime.block_on(self.inner.add(bucket))
    }

    pub fn update(&self, bucket: Bucket) -> RepositoryResult<Bucket> {
        self.runtime.block_on(self.inner.update(bucket))
    }

    pub fn remove(&self, bucket: &Bucket) -> RepositoryResult<()> {
        self.runtime.block_on(self.inner.remove(bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBucketRepository;
    use domain::{BucketError, Item, RepositoryError, specs};

    #[test]
    fn blocking_round_trip_through_in_memory_repository() {
        let repo = BlockingBucketRepository::new(InMemoryBucketRepository::new()).unwrap();

        let mut bucket = repo.add(Bucket::with_size(1).with_name("one")).unwrap();
        let id = bucket.id().unwrap();

        bucket.add_item(Item::named("only")).unwrap();
        assert!(matches!(
            bucket.add_item(Item::named("extra")),
            Err(BucketError::BucketFull { size: 1 })
        ));
        let bucket = repo.update(bucket).unwrap();

        let full = repo.find(&BucketQuery::new(specs::is_full())).unwrap();
        assert_eq!(full.len(), 1);
        assert_eq!(repo.get(id).unwrap().unwrap().item_count(), 1);

        repo.remove(&bucket).unwrap();
        assert!(repo.get(id).unwrap().is_none());
        assert!(matches!(
            repo.remove(&bucket),
            Err(RepositoryError::NotFound(_))
        ));
    }
}
