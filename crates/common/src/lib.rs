//! Shared identifier and version types.

pub mod types;
pub mod version;

pub use types::{BucketId, ItemId};
pub use version::Version;
