//! Bucket commands.

use common::{BucketId, ItemId};

use crate::repository::BucketQuery;

/// Query for a filtered, sorted page of buckets.
pub type ListBuckets = BucketQuery;

/// Command to create a new bucket.
#[derive(Debug, Clone, Default)]
pub struct CreateBucket {
    pub name: Option<String>,
    pub description: Option<String>,

    /// Capacity; the default size is used when absent.
    pub size: Option<i64>,
}

impl CreateBucket {
    /// Creates a CreateBucket command with the default size.
    pub fn new(name: Option<String>, description: Option<String>) -> Self {
        Self {
            name,
            description,
            size: None,
        }
    }

    /// Sets the requested capacity.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Command to replace a bucket's descriptive fields and optionally resize it.
#[derive(Debug, Clone)]
pub struct UpdateBucket {
    pub bucket_id: BucketId,
    pub name: Option<String>,
    pub description: Option<String>,

    /// New capacity; left unchanged when absent.
    pub size: Option<i64>,
}

impl UpdateBucket {
    pub fn new(bucket_id: BucketId, name: Option<String>, description: Option<String>) -> Self {
        Self {
            bucket_id,
            name,
            description,
            size: None,
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Command to create an item inside a bucket.
#[derive(Debug, Clone)]
pub struct AddItem {
    pub bucket_id: BucketId,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl AddItem {
    pub fn new(bucket_id: BucketId, name: Option<String>, description: Option<String>) -> Self {
        Self {
            bucket_id,
            name,
            description,
        }
    }
}

/// Command to replace an item's descriptive fields.
#[derive(Debug, Clone)]
pub struct UpdateItem {
    pub bucket_id: BucketId,
    pub item_id: ItemId,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateItem {
    pub fn new(
        bucket_id: BucketId,
        item_id: ItemId,
        name: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            bucket_id,
            item_id,
            name,
            description,
        }
    }
}

/// Command to remove an item from a bucket.
#[derive(Debug, Clone, Copy)]
pub struct RemoveItem {
    pub bucket_id: BucketId,
    pub item_id: ItemId,
}

impl RemoveItem {
    pub fn new(bucket_id: BucketId, item_id: ItemId) -> Self {
        Self { bucket_id, item_id }
    }
}
