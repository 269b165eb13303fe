//! # Cluster Definition Registry
//!
//! The closed set of EMCAL clustering configurations.
//!
//! Each definition identifies one clustering algorithm variant. The numeric
//! `id` is what cluster rows store in their `definition` column; the `name`
//! is what workflow configuration passes in.
//!
//! New definitions are added by declaring a new constant and listing it in
//! [`REGISTRY`]. There is no runtime registration.

use crate::{AodError, DefinitionId};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Clustering algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ClusterAlgorithm {
    /// Seed-and-grow without local-maximum splitting. Not run by the
    /// reconstruction yet; definitions tagged V1 stay inert configuration.
    V1,
    /// Seed-and-grow with gradient-based splitting.
    V3,
}

impl fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => f.write_str("V1"),
            Self::V3 => f.write_str("V3"),
        }
    }
}

/// Immutable parameter set of one clustering variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterDefinition {
    /// Algorithm family.
    pub algorithm: ClusterAlgorithm,
    /// Storage id, written to the `definition` column of cluster rows.
    pub id: i32,
    /// Definition version.
    pub version: i32,
    /// Lookup name.
    pub name: &'static str,
    /// Minimum energy of the seed cell (GeV).
    pub seed_energy: f64,
    /// Minimum energy of a cell to be aggregated (GeV).
    pub min_cell_energy: f64,
    /// Lower edge of the accepted cell time window (ns).
    pub time_min: f64,
    /// Upper edge of the accepted cell time window (ns).
    pub time_max: f64,
    /// Gradient cut used for exotic-cluster tagging.
    pub gradient_cut: f64,
}

impl ClusterDefinition {
    /// The id as stored in cluster rows.
    #[must_use]
    pub const fn definition_id(&self) -> DefinitionId {
        DefinitionId(self.id)
    }

    /// Whether a cluster time lies inside the definition's time window.
    #[must_use]
    pub fn accepts_time(&self, time: f64) -> bool {
        time >= self.time_min && time <= self.time_max
    }

    /// Whether the reconstruction currently runs this definition's algorithm.
    #[must_use]
    pub const fn is_implemented(&self) -> bool {
        matches!(self.algorithm, ClusterAlgorithm::V3)
    }
}

impl fmt::Display for ClusterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (algorithm {}, id {}, version {})",
            self.name, self.algorithm, self.id, self.version
        )
    }
}

// =============================================================================
// DEFINITIONS
// =============================================================================

/// V1 algorithm, default parameters.
pub const K_V1_DEFAULT: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V1,
    id: 0,
    version: 1,
    name: "kV1Default",
    seed_energy: 0.1,
    min_cell_energy: 0.5,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// First V1 variation. Runs with the V3 algorithm until V1 exists.
pub const K_V1_VARIATION1: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V3,
    id: 1,
    version: 1,
    name: "kV1Variation1",
    seed_energy: 0.1,
    min_cell_energy: 0.3,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// Second V1 variation. Runs with the V3 algorithm until V1 exists.
pub const K_V1_VARIATION2: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V3,
    id: 2,
    version: 1,
    name: "kV1Variation2",
    seed_energy: 0.1,
    min_cell_energy: 0.2,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// V3 algorithm, default parameters.
pub const K_V3_DEFAULT: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V3,
    id: 10,
    version: 1,
    name: "kV3Default",
    seed_energy: 0.1,
    min_cell_energy: 0.5,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// First V3 variation.
pub const K_V3_VARIATION1: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V3,
    id: 11,
    version: 1,
    name: "kV3Variation1",
    seed_energy: 0.1,
    min_cell_energy: 0.3,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// Second V3 variation.
pub const K_V3_VARIATION2: ClusterDefinition = ClusterDefinition {
    algorithm: ClusterAlgorithm::V3,
    id: 12,
    version: 1,
    name: "kV3Variation2",
    seed_energy: 0.1,
    min_cell_energy: 0.2,
    time_min: -10000.0,
    time_max: 10000.0,
    gradient_cut: 0.03,
};

/// Every known definition, in declaration order.
pub static REGISTRY: [ClusterDefinition; 6] = [
    K_V1_DEFAULT,
    K_V1_VARIATION1,
    K_V1_VARIATION2,
    K_V3_DEFAULT,
    K_V3_VARIATION1,
    K_V3_VARIATION2,
];

// =============================================================================
// LOOKUP
// =============================================================================

/// Look up a definition by its exact name.
///
/// Matching is case-sensitive and whole-string. Unknown names fail with
/// `AodError::UnknownClusterDefinition`; there is no fallback definition.
pub fn resolve(name: &str) -> Result<&'static ClusterDefinition, AodError> {
    REGISTRY
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| AodError::UnknownClusterDefinition(name.to_string()))
}

/// Look up a definition by the id stored in cluster rows.
#[must_use]
pub fn by_id(id: DefinitionId) -> Option<&'static ClusterDefinition> {
    REGISTRY.iter().find(|def| def.id == id.0)
}

/// All definitions in registry order.
#[must_use]
pub fn all() -> &'static [ClusterDefinition] {
    &REGISTRY
}

impl FromStr for ClusterDefinition {
    type Err = AodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s).copied()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_round_trips_every_name() {
        for def in all() {
            let found = resolve(def.name).expect("known name");
            assert_eq!(found.name, def.name);
        }
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        for name in ["unknown", "", "kv3default", "kV3Default ", "kV3"] {
            assert!(matches!(
                resolve(name),
                Err(AodError::UnknownClusterDefinition(ref n)) if n == name
            ));
        }
    }

    #[test]
    fn v1_default_literal_values() {
        let def = resolve("kV1Default").expect("resolve");
        assert_eq!(def.algorithm, ClusterAlgorithm::V1);
        assert_eq!(def.id, 0);
        assert_eq!(def.version, 1);
        assert_eq!(def.seed_energy, 0.1);
        assert_eq!(def.min_cell_energy, 0.5);
        assert_eq!(def.time_min, -10000.0);
        assert_eq!(def.time_max, 10000.0);
        assert_eq!(def.gradient_cut, 0.03);
        assert!(!def.is_implemented());
    }

    #[test]
    fn v3_variation2_literal_values() {
        let def = resolve("kV3Variation2").expect("resolve");
        assert_eq!(def.algorithm, ClusterAlgorithm::V3);
        assert_eq!(def.id, 12);
        assert_eq!(def.version, 1);
        assert_eq!(def.seed_energy, 0.1);
        assert_eq!(def.min_cell_energy, 0.2);
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<i32> = all().iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), REGISTRY.len());
    }

    #[test]
    fn by_id_matches_resolve() {
        let def = resolve("kV3Variation1").expect("resolve");
        assert_eq!(by_id(def.definition_id()), Some(def));
        assert!(by_id(DefinitionId(99)).is_none());
    }

    #[test]
    fn from_str_uses_registry() {
        let def: ClusterDefinition = "kV3Default".parse().expect("parse");
        assert_eq!(def, K_V3_DEFAULT);
        assert!("nope".parse::<ClusterDefinition>().is_err());
    }

    #[test]
    fn time_window_is_inclusive() {
        assert!(K_V3_DEFAULT.accepts_time(10000.0));
        assert!(K_V3_DEFAULT.accepts_time(-10000.0));
        assert!(!K_V3_DEFAULT.accepts_time(10000.5));
    }
}
