use thiserror::Error;

/// Errors raised while building predicates and sort orders.
///
/// These describe malformed queries rather than domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The named property does not exist on the entity.
    #[error("Property '{property}' not found on type {type_name}")]
    PropertyNotFound {
        property: String,
        type_name: &'static str,
    },

    /// The property exists but its values have no ordering.
    #[error("Property '{property}' is not comparable")]
    PropertyNotComparable { property: String },

    /// A sort expression contained no keys.
    #[error("Sort expression is empty")]
    EmptySort,
}
