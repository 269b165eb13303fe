//! # aodkit-core
//!
//! Columnar event-data tables for calorimeter clusters, the registry of
//! cluster definitions, and the histogramming analysis tasks that consume
//! them.
//!
//! ## Layout
//!
//! - `cluster_definition`: the closed set of clustering configurations
//! - `cluster`, `table`: cluster rows and the matched/ambiguous tables
//! - `event`: the input streams of one processing pass
//! - `histogram`: named binned counters
//! - `tasks`, `workflow`: analysis tasks and their orchestration
//! - `formats`: binary persistence of the cluster tables
//!
//! ## Constraints
//!
//! - Tables are append-only while a pass is open and read-only afterwards
//! - Every cluster row references exactly one collision or bunch crossing
//! - No async, no threads; the app layer owns all I/O

// =============================================================================
// MODULES
// =============================================================================

pub mod cluster;
pub mod cluster_definition;
pub mod event;
pub mod formats;
pub mod histogram;
pub mod pid;
pub mod primitives;
pub mod table;
pub mod tasks;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AodError, AssociationKind, BcId, CollisionId, DefinitionId, RowIndex};

// =============================================================================
// RE-EXPORTS: Tables
// =============================================================================

pub use cluster::{Association, ClusterRecord, ClusterRow};
pub use cluster_definition::{ClusterAlgorithm, ClusterDefinition};
pub use table::{
    ClusterPass, ClusterTable, ClusterTableWriter, ClusterTables, EMCAL_AMBIGUOUS_CLUSTERS,
    EMCAL_CLUSTERS, SerializableTable, TableSpec,
};

// =============================================================================
// RE-EXPORTS: Analysis
// =============================================================================

pub use event::{
    BunchCrossing, ClusterEntry, Collision, EventBatch, McCollision, McParticle, Track,
    store_clusters,
};
pub use histogram::{Axis, Histogram, HistogramKind, HistogramRegistry};
pub use pid::Species;
pub use tasks::{AnalysisTask, PassInput};
pub use workflow::{TaskToggles, Workflow, WorkflowConfig, WorkflowOutput};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, SerializableTables, tables_from_bytes, tables_to_bytes};

#[cfg(feature = "crypto-hash")]
pub use formats::{compute_blake3_hash, tables_crypto_hash};
