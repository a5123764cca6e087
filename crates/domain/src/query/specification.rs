//! Composable, inspectable boolean predicates.

use std::fmt;
use std::mem::discriminant;

use super::{Property, QueryError, Value};

/// Comparison operator used by [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Returns true for the range operators, which need a comparable property.
    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparison::Eq | Comparison::Ne)
    }

    /// Returns the SQL-style operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Applies the operator to two values.
    ///
    /// Range operators are false whenever either side is null or the two
    /// sides hold different kinds of value.
    pub fn evaluate(self, left: &Value, right: &Value) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            _ if left.is_null() || right.is_null() => false,
            _ if discriminant(left) != discriminant(right) => false,
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Gt => left > right,
            Comparison::Ge => left >= right,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expression tree over the properties of `T`.
///
/// Persistence adapters walk this tree to build a backing-store filter; the
/// same tree is evaluated in process by [`Predicate::evaluate`].
pub enum Predicate<T> {
    /// Always true or always false.
    Constant(bool),
    /// `property op value`.
    Compare {
        property: Property<T>,
        op: Comparison,
        value: Value,
    },
    /// Conjunction of all children.
    And(Vec<Predicate<T>>),
    /// Negation.
    Not(Box<Predicate<T>>),
}

impl<T> Predicate<T> {
    /// Builds a comparison, rejecting range operators on opaque properties.
    pub fn compare(
        property: Property<T>,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        let property = if op.is_ordering() {
            property.ensure_comparable()?
        } else {
            property
        };
        Ok(Predicate::Compare {
            property,
            op,
            value: value.into(),
        })
    }

    /// Evaluates the expression against an entity.
    pub fn evaluate(&self, entity: &T) -> bool {
        match self {
            Predicate::Constant(b) => *b,
            Predicate::Compare {
                property,
                op,
                value,
            } => op.evaluate(&property.value_of(entity), value),
            Predicate::And(children) => children.iter().all(|c| c.evaluate(entity)),
            Predicate::Not(inner) => !inner.evaluate(entity),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Constant(b) => Predicate::Constant(*b),
            Predicate::Compare {
                property,
                op,
                value,
            } => Predicate::Compare {
                property: *property,
                op: *op,
                value: value.clone(),
            },
            Predicate::And(children) => Predicate::And(children.clone()),
            Predicate::Not(inner) => Predicate::Not(inner.clone()),
        }
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Predicate::Constant(a), Predicate::Constant(b)) => a == b,
            (
                Predicate::Compare {
                    property: p1,
                    op: o1,
                    value: v1,
                },
                Predicate::Compare {
                    property: p2,
                    op: o2,
                    value: v2,
                },
            ) => p1 == p2 && o1 == o2 && v1 == v2,
            (Predicate::And(a), Predicate::And(b)) => a == b,
            (Predicate::Not(a), Predicate::Not(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Constant(true) => write!(f, "TRUE"),
            Predicate::Constant(false) => write!(f, "FALSE"),
            Predicate::Compare {
                property,
                op,
                value,
            } => write!(f, "{property} {op} {value}"),
            Predicate::And(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " AND ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            Predicate::Not(inner) => write!(f, "NOT {inner}"),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({self})")
    }
}

/// A reusable, named boolean rule over `T`.
///
/// Specifications are built from a single [`Predicate`] or by AND-composing
/// other specifications with [`Specification::all`].
pub struct Specification<T> {
    predicate: Predicate<T>,
}

impl<T> Specification<T> {
    /// Wraps a predicate.
    pub fn new(predicate: Predicate<T>) -> Self {
        Self { predicate }
    }

    /// A specification satisfied by every entity.
    pub fn matches_all() -> Self {
        Self::new(Predicate::Constant(true))
    }

    /// A specification satisfied by no entity.
    pub fn matches_none() -> Self {
        Self::new(Predicate::Constant(false))
    }

    /// Builds a comparison specification on a typed property.
    pub fn compare(
        property: Property<T>,
        op: Comparison,
        value: impl Into<Value>,
    ) -> Result<Self, QueryError> {
        Predicate::compare(property, op, value).map(Self::new)
    }

    /// AND-composes the given specifications in order.
    ///
    /// Composing nothing yields a specification that matches nothing.
    pub fn all(specs: impl IntoIterator<Item = Specification<T>>) -> Self {
        let children: Vec<Predicate<T>> = specs.into_iter().map(|s| s.predicate).collect();
        if children.is_empty() {
            Self::matches_none()
        } else {
            Self::new(Predicate::And(children))
        }
    }

    /// AND-composes raw predicates; see [`Specification::all`].
    pub fn from_predicates(predicates: impl IntoIterator<Item = Predicate<T>>) -> Self {
        Self::all(predicates.into_iter().map(Self::new))
    }

    /// Combines with another specification using AND.
    pub fn and(self, other: Specification<T>) -> Self {
        Self::all([self, other])
    }

    /// Negates this specification.
    pub fn not(self) -> Self {
        Self::new(Predicate::Not(Box::new(self.predicate)))
    }

    /// Tests an entity against the rule.
    pub fn is_satisfied_by(&self, entity: &T) -> bool {
        self.predicate.evaluate(entity)
    }

    /// Returns the expression tree for translation by a persistence adapter.
    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }

    /// Consumes the specification, returning its expression tree.
    pub fn into_predicate(self) -> Predicate<T> {
        self.predicate
    }

    /// Returns the candidates that satisfy the rule, in their original order.
    pub fn filter<'a>(&self, candidates: &'a [T]) -> Vec<&'a T> {
        candidates
            .iter()
            .filter(|c| self.is_satisfied_by(c))
            .collect()
    }
}

impl<T> From<Predicate<T>> for Specification<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Self::new(predicate)
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("predicate", &self.predicate)
            .finish()
    }
}

impl<T> fmt::Display for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.predicate.fmt(f)
    }
}
