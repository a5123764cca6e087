//! Domain layer for the bucket service.
//!
//! This crate provides:
//! - Bucket aggregate enforcing its capacity invariant, and the Item entity
//! - Specification and SortOrder query descriptors validated against an
//!   entity's property table
//! - BucketRepository, the persistence seam implemented by the store crate
//! - BucketService, the command/query handlers used by the HTTP layer

pub mod bucket;
pub mod error;
pub mod query;
pub mod repository;

pub use bucket::{
    AddItem, Bucket, BucketError, BucketService, CreateBucket, DEFAULT_SIZE, Item, ListBuckets,
    RemoveItem, UpdateBucket, UpdateItem, specs,
};
pub use error::DomainError;
pub use query::{
    Comparison, Entity, Predicate, Property, PropertyKind, PropertyTable, QueryError,
    SortDirection, SortKey, SortOrder, Specification, Value,
};
pub use repository::{
    BucketQuery, BucketRepository, BucketRepositoryExt, RepositoryError, RepositoryResult,
};
