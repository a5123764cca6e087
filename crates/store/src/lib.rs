//! Repository implementations for the bucket aggregate.
//!
//! - [`InMemoryBucketRepository`]: process-local storage for tests and demos
//! - [`PostgresBucketRepository`]: sqlx-backed storage with cascading items
//! - [`BlockingBucketRepository`]: synchronous facade over either

pub mod blocking;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod sql;

pub use blocking::BlockingBucketRepository;
pub use error::{Result, StoreError};
pub use memory::InMemoryBucketRepository;
pub use postgres::PostgresBucketRepository;
