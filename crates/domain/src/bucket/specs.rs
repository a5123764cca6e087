//! Reusable specifications over buckets.
//!
//! Each function returns a fresh [`Specification`]; combine them with
//! [`Specification::all`] or [`Specification::and`].

use crate::query::{Comparison, Predicate, Property, Specification, Value};

use super::Bucket;

fn compare(
    property: Property<Bucket>,
    op: Comparison,
    value: impl Into<Value>,
) -> Specification<Bucket> {
    Specification::new(Predicate::Compare {
        property,
        op,
        value: value.into(),
    })
}

/// Satisfied by every bucket.
pub fn matches_all() -> Specification<Bucket> {
    Specification::matches_all()
}

/// Buckets with no free slot.
pub fn is_full() -> Specification<Bucket> {
    compare(Bucket::AVAILABLE, Comparison::Le, 0i64)
}

/// Buckets holding no items.
pub fn is_empty() -> Specification<Bucket> {
    compare(Bucket::ITEM_COUNT, Comparison::Eq, 0i64)
}

/// Buckets whose total capacity is at most `n`.
pub fn size_at_most(n: u32) -> Specification<Bucket> {
    compare(Bucket::SIZE, Comparison::Le, n)
}

/// Buckets whose total capacity is at least `n`.
pub fn size_at_least(n: u32) -> Specification<Bucket> {
    compare(Bucket::SIZE, Comparison::Ge, n)
}

/// Buckets with at most `n` free slots.
pub fn available_at_most(n: u32) -> Specification<Bucket> {
    compare(Bucket::AVAILABLE, Comparison::Le, n)
}

/// Buckets with at least `n` free slots.
pub fn available_at_least(n: u32) -> Specification<Bucket> {
    compare(Bucket::AVAILABLE, Comparison::Ge, n)
}

/// Buckets holding at most `n` items.
pub fn occupied_at_most(n: u32) -> Specification<Bucket> {
    compare(Bucket::ITEM_COUNT, Comparison::Le, n)
}

/// Buckets holding at least `n` items.
pub fn occupied_at_least(n: u32) -> Specification<Bucket> {
    compare(Bucket::ITEM_COUNT, Comparison::Ge, n)
}

/// Buckets with exactly this name.
pub fn named(name: impl Into<String>) -> Specification<Bucket> {
    compare(Bucket::NAME, Comparison::Eq, name.into())
}
