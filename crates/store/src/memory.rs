use std::sync::Arc;

use async_trait::async_trait;
use common::{BucketId, Version};
use domain::repository::require_id;
use domain::{Bucket, BucketQuery, BucketRepository, RepositoryError, RepositoryResult};
use tokio::sync::RwLock;

/// In-memory bucket repository for testing.
///
/// Buckets are kept in insertion order, which is also the order returned by
/// unsorted queries. Filters and sort orders are evaluated in process. Item
/// ids are unique within a bucket only, as in the `items` table.
#[derive(Clone, Default)]
pub struct InMemoryBucketRepository {
    buckets: Arc<RwLock<Vec<Bucket>>>,
}

impl InMemoryBucketRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored buckets.
    pub async fn bucket_count(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// Returns the number of stored items across all buckets.
    pub async fn item_count(&self) -> usize {
        self.buckets
            .read()
            .await
            .iter()
            .map(Bucket::item_count)
            .sum()
    }

    /// Removes every bucket.
    pub async fn clear(&self) {
        self.buckets.write().await.clear();
    }
}

#[async_trait]
impl BucketRepository for InMemoryBucketRepository {
    async fn get(&self, id: BucketId) -> RepositoryResult<Option<Bucket>> {
        let store = self.buckets.read().await;
        Ok(store.iter().find(|b| b.id() == Some(id)).cloned())
    }

    async fn find(&self, query: &BucketQuery) -> RepositoryResult<Vec<Bucket>> {
        let store = self.buckets.read().await;
        Ok(query.apply(store.iter().cloned()))
    }

    async fn add(&self, mut bucket: Bucket) -> RepositoryResult<Bucket> {
        let mut store = self.buckets.write().await;

        let id = bucket.id().unwrap_or_default();
        if store.iter().any(|b| b.id() == Some(id)) {
            return Err(RepositoryError::AlreadyExists(id));
        }

        bucket.assign_id(id);
        bucket.set_version(Version::first());
        store.push(bucket.clone());

        Ok(bucket)
    }

    async fn update(&self, mut bucket: Bucket) -> RepositoryResult<Bucket> {
        let id = require_id(&bucket)?;
        let mut store = self.buckets.write().await;

        let stored = store
            .iter_mut()
            .find(|b| b.id() == Some(id))
            .ok_or(RepositoryError::NotFound(id))?;

        if stored.version() != bucket.version() {
            return Err(RepositoryError::ConcurrencyConflict {
                id,
                expected: bucket.version(),
                actual: stored.version(),
            });
        }

        bucket.set_version(bucket.version().next());
        *stored = bucket.clone();

        Ok(bucket)
    }

    async fn remove(&self, bucket: &Bucket) -> RepositoryResult<()> {
        let id = require_id(bucket)?;
        let mut store = self.buckets.write().await;

        let index = store
            .iter()
            .position(|b| b.id() == Some(id))
            .ok_or(RepositoryError::NotFound(id))?;
        store.remove(index);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Item, SortOrder, specs};

    async fn seeded(
        repo: &InMemoryBucketRepository,
        name: &str,
        size: u32,
        items: usize,
    ) -> Bucket {
        let mut bucket = Bucket::with_size(size).with_name(name);
        for _ in 0..items {
            bucket.add_item(Item::new(None, None)).unwrap();
        }
        repo.add(bucket).await.unwrap()
    }

    #[tokio::test]
    async fn add_assigns_identity_and_first_version() {
        let repo = InMemoryBucketRepository::new();
        let bucket = repo.add(Bucket::new()).await.unwrap();

        assert!(bucket.id().is_some());
        assert_eq!(bucket.version(), Version::first());
        assert_eq!(repo.bucket_count().await, 1);
    }

    #[tokio::test]
    async fn add_existing_id_fails() {
        let repo = InMemoryBucketRepository::new();
        let bucket = repo.add(Bucket::new()).await.unwrap();

        let result = repo.add(bucket).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn get_returns_whole_aggregate() {
        let repo = InMemoryBucketRepository::new();
        let stored = seeded(&repo, "a", 3, 2).await;

        let loaded = repo.get(stored.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.item_count(), 2);
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let repo = InMemoryBucketRepository::new();
        assert!(repo.get(BucketId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_bumps_version() {
        let repo = InMemoryBucketRepository::new();
        let mut bucket = seeded(&repo, "a", 3, 0).await;

        bucket.add_item(Item::named("x")).unwrap();
        let updated = repo.update(bucket).await.unwrap();

        assert_eq!(updated.version(), Version::new(2));
        let loaded = repo.get(updated.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.item_count(), 1);
    }

    #[tokio::test]
    async fn same_item_can_be_held_by_two_buckets() {
        let repo = InMemoryBucketRepository::new();
        let shared = Item::named("shared");

        let mut left = seeded(&repo, "left", 2, 0).await;
        let mut right = seeded(&repo, "right", 2, 0).await;
        left.add_item(shared.clone()).unwrap();
        right.add_item(shared.clone()).unwrap();

        let left = repo.update(left).await.unwrap();
        let right = repo.update(right).await.unwrap();

        for id in [left.id().unwrap(), right.id().unwrap()] {
            let loaded = repo.get(id).await.unwrap().unwrap();
            assert_eq!(loaded.items(), std::slice::from_ref(&shared));
        }

        repo.remove(&left).await.unwrap();
        let loaded = repo.get(right.id().unwrap()).await.unwrap().unwrap();
        assert!(loaded.contains(shared.id()));
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let repo = InMemoryBucketRepository::new();
        let bucket = seeded(&repo, "a", 3, 0).await;
        let stale = bucket.clone();

        repo.update(bucket).await.unwrap();
        let result = repo.update(stale).await;

        assert!(matches!(
            result,
            Err(RepositoryError::ConcurrencyConflict { expected, actual, .. })
                if expected == Version::first() && actual == Version::new(2)
        ));
    }

    #[tokio::test]
    async fn transient_bucket_cannot_be_updated_or_removed() {
        let repo = InMemoryBucketRepository::new();
        assert!(matches!(
            repo.update(Bucket::new()).await,
            Err(RepositoryError::MissingIdentity)
        ));
        assert!(matches!(
            repo.remove(&Bucket::new()).await,
            Err(RepositoryError::MissingIdentity)
        ));
    }

    #[tokio::test]
    async fn remove_drops_bucket_and_items() {
        let repo = InMemoryBucketRepository::new();
        let bucket = seeded(&repo, "a", 3, 3).await;
        seeded(&repo, "b", 3, 1).await;

        repo.remove(&bucket).await.unwrap();

        assert_eq!(repo.bucket_count().await, 1);
        assert_eq!(repo.item_count().await, 1);
        assert!(matches!(
            repo.remove(&bucket).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_with_filter_sort_and_pagination() {
        let repo = InMemoryBucketRepository::new();
        seeded(&repo, "full", 2, 2).await;
        seeded(&repo, "big", 9, 1).await;
        seeded(&repo, "small", 3, 0).await;
        seeded(&repo, "mid", 5, 0).await;

        let query = BucketQuery::new(specs::available_at_least(1))
            .sort(SortOrder::order_by_descending(Bucket::SIZE).unwrap())
            .offset(1)
            .limit(2);
        let found = repo.find(&query).await.unwrap();

        let names: Vec<_> = found.iter().filter_map(Bucket::name).collect();
        assert_eq!(names, vec!["mid", "small"]);
    }
}
