//! Bucket aggregate and related types.

mod aggregate;
mod commands;
mod item;
mod service;
pub mod specs;

pub use aggregate::{Bucket, DEFAULT_SIZE};
pub use commands::{AddItem, CreateBucket, ListBuckets, RemoveItem, UpdateBucket, UpdateItem};
pub use item::Item;
pub use service::BucketService;

use common::ItemId;
use thiserror::Error;

/// Errors raised by bucket invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketError {
    /// The bucket has no spare capacity.
    #[error("Bucket is full: all {size} slots are taken")]
    BucketFull { size: u32 },

    /// The requested size is negative, too large, or below current occupancy.
    #[error("Invalid bucket size {requested}: must be between {minimum} and {maximum}")]
    InvalidSize {
        requested: i64,
        minimum: usize,
        maximum: u32,
    },

    /// The same item appears twice in stored data.
    #[error("Duplicate item {0} in bucket")]
    DuplicateItem(ItemId),
}

impl BucketError {
    pub(crate) fn invalid_size(requested: i64, occupancy: usize) -> Self {
        BucketError::InvalidSize {
            requested,
            minimum: occupancy,
            maximum: u32::MAX,
        }
    }
}
