//! Validated multi-key sort orders.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Property, QueryError};

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// One `(property, direction)` pair of a sort order.
pub struct SortKey<T> {
    property: Property<T>,
    direction: SortDirection,
}

impl<T> SortKey<T> {
    pub fn property(&self) -> Property<T> {
        self.property
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        let ordering = self.property.value_of(a).cmp(&self.property.value_of(b));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SortKey<T> {}

impl<T> PartialEq for SortKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property && self.direction == other.direction
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property.name(), self.direction.keyword())
    }
}

/// An immutable, ordered list of sort keys.
///
/// The first key is the primary sort; each later key breaks ties left by
/// the keys before it. Every builder call validates the new key and returns
/// a new value, leaving `self` untouched, so a partial order can be shared
/// as the base of several variants.
///
/// ```
/// use domain::{Bucket, SortOrder};
///
/// let by_size = SortOrder::order_by(Bucket::SIZE).unwrap();
/// let by_size_then_name = by_size.then_by(Bucket::NAME).unwrap();
/// assert_eq!(by_size.keys().len(), 1);
/// assert_eq!(by_size_then_name.keys().len(), 2);
/// ```
pub struct SortOrder<T> {
    keys: Vec<SortKey<T>>,
}

impl<T> SortOrder<T> {
    /// Starts an ascending order on `property`.
    pub fn order_by(property: Property<T>) -> Result<Self, QueryError> {
        Self::start(property, SortDirection::Ascending)
    }

    /// Starts a descending order on `property`.
    pub fn order_by_descending(property: Property<T>) -> Result<Self, QueryError> {
        Self::start(property, SortDirection::Descending)
    }

    /// Returns a new order with an ascending tie-breaker appended.
    pub fn then_by(&self, property: Property<T>) -> Result<Self, QueryError> {
        self.append(property, SortDirection::Ascending)
    }

    /// Returns a new order with a descending tie-breaker appended.
    pub fn then_by_descending(&self, property: Property<T>) -> Result<Self, QueryError> {
        self.append(property, SortDirection::Descending)
    }

    fn start(property: Property<T>, direction: SortDirection) -> Result<Self, QueryError> {
        let property = property.ensure_comparable()?;
        Ok(Self {
            keys: vec![SortKey {
                property,
                direction,
            }],
        })
    }

    fn append(&self, property: Property<T>, direction: SortDirection) -> Result<Self, QueryError> {
        let property = property.ensure_comparable()?;
        let mut keys = self.keys.clone();
        keys.push(SortKey {
            property,
            direction,
        });
        Ok(Self { keys })
    }

    /// Returns the keys in precedence order (primary first).
    pub fn keys(&self) -> &[SortKey<T>] {
        &self.keys
    }

    /// Compares two entities key by key.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| key.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sorts a slice in place. The sort is stable.
    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl<T> Clone for SortOrder<T> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<T> PartialEq for SortOrder<T> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl<T> fmt::Debug for SortOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

impl<T> fmt::Display for SortOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", key.property.name(), key.direction.keyword())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Value;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        a: i64,
        b: i64,
    }

    const A: Property<Row> = Property::comparable("A", |r: &Row| Value::Int(r.a));
    const B: Property<Row> = Property::comparable("B", |r: &Row| Value::Int(r.b));
    const BLOB: Property<Row> = Property::opaque("Blob", |_: &Row| Value::Null);

    fn row(a: i64, b: i64) -> Row {
        Row { a, b }
    }

    #[test]
    fn secondary_key_breaks_ties() {
        let order = SortOrder::order_by(A).unwrap().then_by_descending(B).unwrap();
        let mut rows = vec![row(5, 2), row(3, 1), row(5, 1), row(5, 3)];
        order.sort(&mut rows);
        assert_eq!(rows, vec![row(3, 1), row(5, 3), row(5, 2), row(5, 1)]);
    }

    #[test]
    fn descending_primary() {
        let order = SortOrder::order_by_descending(A).unwrap();
        let mut rows = vec![row(1, 0), row(3, 0), row(2, 0)];
        order.sort(&mut rows);
        assert_eq!(rows, vec![row(3, 0), row(2, 0), row(1, 0)]);
    }

    #[test]
    fn builder_does_not_mutate_base() {
        let base = SortOrder::order_by(A).unwrap();
        let left = base.then_by(B).unwrap();
        let right = base.then_by_descending(B).unwrap();

        assert_eq!(base.keys().len(), 1);
        assert_eq!(left.keys()[1].direction(), SortDirection::Ascending);
        assert_eq!(right.keys()[1].direction(), SortDirection::Descending);
    }

    #[test]
    fn keys_enumerate_in_insertion_order() {
        let order = SortOrder::order_by(B).unwrap().then_by(A).unwrap();
        let names: Vec<&str> = order.keys().iter().map(|k| k.property().name()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(order.to_string(), "B ASC, A ASC");
    }

    #[test]
    fn opaque_property_rejected_at_every_position() {
        assert!(matches!(
            SortOrder::order_by(BLOB),
            Err(QueryError::PropertyNotComparable { .. })
        ));
        let base = SortOrder::order_by(A).unwrap();
        assert!(matches!(
            base.then_by_descending(BLOB),
            Err(QueryError::PropertyNotComparable { .. })
        ));
    }
}
