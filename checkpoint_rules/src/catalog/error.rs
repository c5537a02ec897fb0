//! Catalog errors.

use thiserror::Error;

/// A cross-entity reference that points at nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
    /// Record holding the reference, e.g. `ship_type:courier`.
    pub owner: String,
    pub field: &'static str,
    pub missing: String,
}

impl std::fmt::Display for UnresolvedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} -> {}", self.owner, self.field, self.missing)
    }
}

/// A record that breaks a structural rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub id: String,
    pub reason: String,
}

impl std::fmt::Display for InvalidRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.reason)
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fatal load-time errors. A catalog that fails any check is never exposed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog source {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("unresolved references: {}", join(.0))]
    Unresolved(Vec<UnresolvedRef>),

    #[error("invalid records: {}", join(.0))]
    InvalidRecords(Vec<InvalidRecord>),

    #[error("required pool is empty: {0}")]
    EmptyPool(&'static str),
}

/// An id lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} not found: {id}")]
pub struct NotFound {
    pub kind: &'static str,
    pub id: String,
}

impl NotFound {
    /// Create a lookup miss for `kind` and `id`.
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}
