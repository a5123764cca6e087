//! Bucket service providing the application-level API for bucket operations.

use common::{BucketId, ItemId};

use crate::error::DomainError;
use crate::query::SortOrder;
use crate::repository::{BucketQuery, BucketRepository};

use super::{
    AddItem, Bucket, BucketError, CreateBucket, Item, RemoveItem, UpdateBucket, UpdateItem,
};

/// Service for managing buckets and their items.
///
/// Each command loads the whole aggregate, mutates it through `Bucket`'s
/// methods and writes it back. Capacity is checked in memory before anything
/// is written.
pub struct BucketService<R: BucketRepository> {
    repository: R,
}

impl<R: BucketRepository> BucketService<R> {
    /// Creates a new bucket service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Creates and stores a new bucket.
    #[tracing::instrument(skip(self))]
    pub async fn create_bucket(&self, cmd: CreateBucket) -> Result<Bucket, DomainError> {
        let mut bucket = Bucket::new();
        bucket.rename(cmd.name);
        bucket.describe(cmd.description);
        if let Some(size) = cmd.size {
            bucket.set_size(size)?;
        }

        let bucket = self.repository.add(bucket).await?;

        metrics::counter!("buckets_created_total").increment(1);
        tracing::info!(bucket_id = ?bucket.id(), size = bucket.size(), "bucket created");
        Ok(bucket)
    }

    /// Loads a bucket by ID.
    ///
    /// Returns None if the bucket doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_bucket(&self, bucket_id: BucketId) -> Result<Option<Bucket>, DomainError> {
        Ok(self.repository.get(bucket_id).await?)
    }

    /// Lists buckets matching a query.
    #[tracing::instrument(skip(self, query), fields(filter = %query.specification))]
    pub async fn list_buckets(&self, query: &BucketQuery) -> Result<Vec<Bucket>, DomainError> {
        Ok(self.repository.find(query).await?)
    }

    /// Replaces a bucket's name and description, resizing it if requested.
    #[tracing::instrument(skip(self))]
    pub async fn update_bucket(&self, cmd: UpdateBucket) -> Result<Bucket, DomainError> {
        let mut bucket = self.load(cmd.bucket_id).await?;

        if let Some(size) = cmd.size {
            bucket.set_size(size)?;
        }
        bucket.rename(cmd.name);
        bucket.describe(cmd.description);

        Ok(self.repository.update(bucket).await?)
    }

    /// Deletes a bucket and all of its items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_bucket(&self, bucket_id: BucketId) -> Result<(), DomainError> {
        let bucket = self.load(bucket_id).await?;
        self.repository.remove(&bucket).await?;

        tracing::info!(%bucket_id, items = bucket.item_count(), "bucket deleted");
        Ok(())
    }

    /// Creates an item and adds it to a bucket.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(&self, cmd: AddItem) -> Result<Item, DomainError> {
        let mut bucket = self.load(cmd.bucket_id).await?;
        let item = Item::new(cmd.name, cmd.description);

        if let Err(e) = bucket.add_item(item.clone()) {
            if matches!(e, BucketError::BucketFull { .. }) {
                metrics::counter!("bucket_capacity_rejections_total").increment(1);
                tracing::warn!(bucket_id = %cmd.bucket_id, size = bucket.size(), "bucket full");
            }
            return Err(e.into());
        }

        self.repository.update(bucket).await?;

        metrics::counter!("bucket_items_added_total").increment(1);
        Ok(item)
    }

    /// Loads one item of a bucket.
    #[tracing::instrument(skip(self))]
    pub async fn get_item(
        &self,
        bucket_id: BucketId,
        item_id: ItemId,
    ) -> Result<Item, DomainError> {
        let bucket = self.load(bucket_id).await?;
        bucket
            .item(item_id)
            .cloned()
            .ok_or(DomainError::ItemNotFound { bucket_id, item_id })
    }

    /// Lists the items of a bucket, in insertion order unless sorted.
    #[tracing::instrument(skip(self, sort))]
    pub async fn list_items(
        &self,
        bucket_id: BucketId,
        sort: Option<&SortOrder<Item>>,
    ) -> Result<Vec<Item>, DomainError> {
        let bucket = self.load(bucket_id).await?;
        let mut items = bucket.items().to_vec();
        if let Some(sort) = sort {
            sort.sort(&mut items);
        }
        Ok(items)
    }

    /// Replaces an item's name and description.
    #[tracing::instrument(skip(self))]
    pub async fn update_item(&self, cmd: UpdateItem) -> Result<Item, DomainError> {
        let mut bucket = self.load(cmd.bucket_id).await?;

        let item = bucket
            .item_mut(cmd.item_id)
            .ok_or(DomainError::ItemNotFound {
                bucket_id: cmd.bucket_id,
                item_id: cmd.item_id,
            })?;
        item.rename(cmd.name);
        item.describe(cmd.description);
        let item = item.clone();

        self.repository.update(bucket).await?;
        Ok(item)
    }

    /// Removes an item from a bucket, returning it.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(&self, cmd: RemoveItem) -> Result<Item, DomainError> {
        let mut bucket = self.load(cmd.bucket_id).await?;

        let item = bucket
            .remove_item(cmd.item_id)
            .ok_or(DomainError::ItemNotFound {
                bucket_id: cmd.bucket_id,
                item_id: cmd.item_id,
            })?;

        self.repository.update(bucket).await?;

        metrics::counter!("bucket_items_removed_total").increment(1);
        Ok(item)
    }

    async fn load(&self, bucket_id: BucketId) -> Result<Bucket, DomainError> {
        self.repository
            .get(bucket_id)
            .await?
            .ok_or(DomainError::BucketNotFound(bucket_id))
    }
}
