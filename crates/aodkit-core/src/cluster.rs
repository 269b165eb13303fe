//! # Cluster Rows
//!
//! The column set shared by the matched and the ambiguous cluster tables.
//!
//! A row carries exactly one foreign key. Instead of two structurally
//! identical row types that differ only in which index column is filled,
//! the reference is a single [`Association`] value whose variant states
//! which set it points into.

use crate::{AssociationKind, BcId, CollisionId, DefinitionId, RowIndex};
use serde::{Deserialize, Serialize};

/// Per-cluster columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Cluster id identifying the cluster in its event.
    pub id: i32,
    /// Cluster energy (GeV).
    pub energy: f32,
    /// Cluster core energy (GeV).
    pub core_energy: f32,
    /// Pseudorapidity, calculated using the vertex.
    pub eta: f32,
    /// Azimuthal angle, calculated using the vertex.
    pub phi: f32,
    /// Shower shape long axis.
    pub m02: f32,
    /// Shower shape short axis.
    pub m20: f32,
    /// Number of cells in the cluster.
    pub n_cells: i32,
    /// Cluster time (ns).
    pub time: f32,
    /// Exotic cluster flag.
    pub is_exotic: bool,
    /// Distance to the nearest bad channel.
    pub distance_to_bad_channel: f32,
    /// Number of local maxima.
    pub nlm: i32,
    /// Id of the cluster definition that produced this cluster.
    pub definition: DefinitionId,
}

/// The single foreign key of a cluster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Association {
    /// Matched cluster.
    Collision(CollisionId),
    /// Ambiguous cluster.
    BunchCrossing(BcId),
}

impl Association {
    /// Which foreign key this is.
    #[must_use]
    pub const fn kind(self) -> AssociationKind {
        match self {
            Self::Collision(_) => AssociationKind::Collision,
            Self::BunchCrossing(_) => AssociationKind::BunchCrossing,
        }
    }

    /// The raw referenced index, regardless of kind.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Collision(CollisionId(i)) | Self::BunchCrossing(BcId(i)) => i,
        }
    }

    /// The collision reference, if this is a matched cluster.
    #[must_use]
    pub const fn collision(self) -> Option<CollisionId> {
        match self {
            Self::Collision(id) => Some(id),
            Self::BunchCrossing(_) => None,
        }
    }

    /// The bunch-crossing reference, if this is an ambiguous cluster.
    #[must_use]
    pub const fn bunch_crossing(self) -> Option<BcId> {
        match self {
            Self::Collision(_) => None,
            Self::BunchCrossing(id) => Some(id),
        }
    }
}

/// One stored row: implicit index, foreign key, and the cluster columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub index: RowIndex,
    pub association: Association,
    pub record: ClusterRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_accessors_are_exclusive() {
        let matched = Association::Collision(CollisionId(3));
        assert_eq!(matched.kind(), AssociationKind::Collision);
        assert_eq!(matched.collision(), Some(CollisionId(3)));
        assert_eq!(matched.bunch_crossing(), None);
        assert_eq!(matched.index(), 3);

        let ambiguous = Association::BunchCrossing(BcId(7));
        assert_eq!(ambiguous.kind(), AssociationKind::BunchCrossing);
        assert_eq!(ambiguous.collision(), None);
        assert_eq!(ambiguous.bunch_crossing(), Some(BcId(7)));
        assert_eq!(ambiguous.index(), 7);
    }
}
