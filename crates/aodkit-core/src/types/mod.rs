//! # Core Type Definitions
//!
//! This module contains the shared identifiers and the error type:
//! - Row and reference identifiers (`CollisionId`, `BcId`, `RowIndex`, `DefinitionId`)
//! - Association kinds for the cluster tables (`AssociationKind`)
//! - Error types (`AodError`)
//!
//! ## Ordering
//!
//! All identifiers implement `Ord` so they can key `BTreeMap`s and produce
//! deterministic iteration order in summaries and grouped views.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Index of a reconstructed collision within one processing pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct CollisionId(pub u32);

/// Index of a bunch crossing within one processing pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct BcId(pub u32);

/// Implicit row index of a table. Monotonically increasing from 0 in
/// insertion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct RowIndex(pub u64);

impl RowIndex {
    /// Get the raw index value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The row index that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Numeric id of a cluster definition, as stored in the `definition` column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct DefinitionId(pub i32);

// =============================================================================
// ASSOCIATION KIND
// =============================================================================

/// Which foreign key a cluster row carries.
///
/// Clusters that could be matched to a collision reference the collision;
/// clusters that could not be matched reference the raw bunch crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    /// Matched cluster, references a collision.
    Collision,
    /// Ambiguous cluster, references a bunch crossing.
    BunchCrossing,
}

impl AssociationKind {
    /// Short lowercase name, used in summaries and JSON output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::BunchCrossing => "bc",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in aodkit.
///
/// - No silent failures
/// - Use `Result<T, AodError>` for fallible operations
/// - The core never panics; configuration errors are meant to stop
///   workflow startup, everything else is reported to the caller
#[derive(Debug, Error)]
pub enum AodError {
    /// The requested cluster definition name is not one of the known constants.
    #[error("Cluster definition name not recognized: {0}")]
    UnknownClusterDefinition(String),

    /// A row was appended to a table that carries the other foreign key.
    #[error("Association mismatch for table {table}: expected {expected}, found {found}")]
    AssociationMismatch {
        table: &'static str,
        expected: AssociationKind,
        found: AssociationKind,
    },

    /// A row references a collision or bunch crossing outside the supplied set.
    #[error("Dangling {kind} reference {index} (set has {bound} entries)")]
    DanglingReference {
        kind: AssociationKind,
        index: u32,
        bound: u32,
    },

    /// A table grew past the per-pass row limit.
    #[error("Table {0} is full")]
    TableFull(&'static str),

    /// The requested histogram is not registered.
    #[error("Histogram not found: {0}")]
    HistogramNotFound(String),

    /// A histogram with the same name is already registered.
    #[error("Duplicate histogram: {0}")]
    DuplicateHistogram(String),

    /// Histogram definitions are fixed once initialization is over.
    #[error("Histogram registry {0} is frozen")]
    RegistryFrozen(String),

    /// Axis binning is malformed.
    #[error("Invalid axis: {0}")]
    InvalidAxis(String),

    /// A 1-D fill was requested for a 2-D histogram or vice versa.
    #[error("Dimension mismatch for {name}: histogram has {expected} axes, fill has {found}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Workflow configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input data references something that does not exist.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_index_next_is_monotonic() {
        let row = RowIndex(41);
        assert_eq!(row.next().value(), 42);
        assert_eq!(RowIndex(u64::MAX).next().value(), u64::MAX);
    }

    #[test]
    fn association_kind_names() {
        assert_eq!(AssociationKind::Collision.to_string(), "collision");
        assert_eq!(AssociationKind::BunchCrossing.to_string(), "bc");
    }

    #[test]
    fn unknown_definition_message_names_input() {
        let err = AodError::UnknownClusterDefinition("kV9".to_string());
        assert_eq!(
            err.to_string(),
            "Cluster definition name not recognized: kV9"
        );
    }
}
