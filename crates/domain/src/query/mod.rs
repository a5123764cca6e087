//! Query-building primitives shared by every entity.
//!
//! - [`Property`] / [`PropertyTable`]: typed accessors and name lookup
//! - [`Specification`] / [`Predicate`]: inspectable boolean filters
//! - [`SortOrder`]: validated multi-key ordering

mod error;
mod property;
mod sort;
mod specification;
mod value;

pub use error::QueryError;
pub use property::{Entity, Property, PropertyKind, PropertyTable};
pub use sort::{SortDirection, SortKey, SortOrder};
pub use specification::{Comparison, Predicate, Specification};
pub use value::Value;
