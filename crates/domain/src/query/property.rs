//! Typed property accessors and the per-entity lookup table.

use std::fmt;

use super::{Comparison, Predicate, QueryError, SortOrder, Value};

/// Whether a property's values support an ordering relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Values can be ordered, sorted on and range-compared.
    Comparable,
    /// Values can only be read (e.g. collections).
    Opaque,
}

/// A named, typed accessor for one property of `T`.
///
/// Properties are declared as associated constants on the entity
/// (`Bucket::SIZE`), which makes them compile-time selectors. Runtime
/// name-based lookup goes through [`PropertyTable`].
pub struct Property<T> {
    name: &'static str,
    kind: PropertyKind,
    get: fn(&T) -> Value,
}

impl<T> Property<T> {
    /// Declares a property whose values can be ordered.
    pub const fn comparable(name: &'static str, get: fn(&T) -> Value) -> Self {
        Self {
            name,
            kind: PropertyKind::Comparable,
            get,
        }
    }

    /// Declares a property whose values have no ordering.
    pub const fn opaque(name: &'static str, get: fn(&T) -> Value) -> Self {
        Self {
            name,
            kind: PropertyKind::Opaque,
            get,
        }
    }

    /// Returns the canonical property name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the property kind.
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Returns true if values of this property can be ordered.
    pub fn is_comparable(&self) -> bool {
        self.kind == PropertyKind::Comparable
    }

    /// Reads the property from an entity.
    pub fn value_of(&self, entity: &T) -> Value {
        (self.get)(entity)
    }

    /// Returns the property unchanged if it is comparable.
    pub fn ensure_comparable(self) -> Result<Self, QueryError> {
        if self.is_comparable() {
            Ok(self)
        } else {
            Err(QueryError::PropertyNotComparable {
                property: self.name.to_string(),
            })
        }
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Property<T> {}

impl<T> PartialEq for Property<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl<T> Eq for Property<T> {}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<T> fmt::Display for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An entity that exposes its properties to queries.
pub trait Entity: Sized + 'static {
    /// Type name used in error messages.
    const TYPE_NAME: &'static str;

    /// All properties of the entity, comparable or not.
    fn properties() -> Vec<Property<Self>>;

    /// Builds the lookup table for this entity.
    ///
    /// Build it once (at startup) and share it; resolving a name is then a
    /// scan over a handful of entries rather than a fresh table per call.
    fn property_table() -> PropertyTable<Self> {
        PropertyTable::new(Self::TYPE_NAME, Self::properties())
    }
}

/// Name-to-property lookup for one entity type.
///
/// Names are matched case-insensitively, so `"size"` and `"Size"` both
/// resolve to the same property.
pub struct PropertyTable<T> {
    type_name: &'static str,
    properties: Vec<Property<T>>,
}

impl<T> PropertyTable<T> {
    /// Creates a table from a list of properties.
    pub fn new(type_name: &'static str, properties: impl IntoIterator<Item = Property<T>>) -> Self {
        Self {
            type_name,
            properties: properties.into_iter().collect(),
        }
    }

    /// Returns the entity type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns all registered properties in declaration order.
    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    /// Resolves a property by name.
    pub fn property(&self, name: &str) -> Result<Property<T>, QueryError> {
        let name = name.trim();
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| QueryError::PropertyNotFound {
                property: name.to_string(),
                type_name: self.type_name,
            })
    }

    /// Starts an ascending sort order on the named property.
    pub fn order_by(&self, name: &str) -> Result<SortOrder<T>, QueryError> {
        SortOrder::order_by(self.property(name)?)
    }

    /// Starts a descending sort order on the named property.
    pub fn order_by_descending(&self, name: &str) -> Result<SortOrder<T>, QueryError> {
        SortOrder::order_by_descending(self.property(name)?)
    }

    /// Appends an ascending key, resolved by name, to an existing order.
    pub fn then_by(&self, order: &SortOrder<T>, name: &str) -> Result<SortOrder<T>, QueryError> {
        order.then_by(self.property(name)?)
    }

    /// Appends a descending key, resolved by name, to an existing order.
    pub fn then_by_descending(
        &self,
        order: &SortOrder<T>,
        name: &str,
    ) -> Result<SortOrder<T>, QueryError> {
        order.then_by_descending(self.property(name)?)
    }

    /// Parses a comma-separated sort expression such as `"size,-id"`.
    ///
    /// A leading `-` makes a key descending and an optional `+` ascending.
    /// Keys keep their written order as precedence.
    pub fn parse_sort(&self, expr: &str) -> Result<SortOrder<T>, QueryError> {
        let mut order: Option<SortOrder<T>> = None;

        for token in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (name, descending) = match token.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (token.strip_prefix('+').unwrap_or(token), false),
            };
            let property = self.property(name)?;

            order = Some(match (order, descending) {
                (None, false) => SortOrder::order_by(property)?,
                (None, true) => SortOrder::order_by_descending(property)?,
                (Some(o), false) => o.then_by(property)?,
                (Some(o), true) => o.then_by_descending(property)?,
            });
        }

        order.ok_or(QueryError::EmptySort)
    }

    /// Builds a comparison predicate on the named property.
    pub fn compare(
        &self,
        name: &str,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Result<Predicate<T>, QueryError> {
        Predicate::compare(self.property(name)?, op, value)
    }
}

impl<T> fmt::Debug for PropertyTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTable")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .finish()
    }
}
