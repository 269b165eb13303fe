//! # Fixed Primitives
//!
//! Compiled-in constants for the aodkit core. None of these change at
//! runtime.

/// Data origin shared by all tables produced by this crate.
pub const TABLE_ORIGIN: &str = "AOD";

/// Description of the table of clusters matched to a collision.
pub const EMCAL_CLUSTERS_DESCRIPTION: &str = "EMCALCLUSTERS";

/// Description of the table of clusters that could not be matched.
pub const EMCAL_AMBIGUOUS_CLUSTERS_DESCRIPTION: &str = "EMCALAMBCLUS";

/// Magic bytes for the aodkit binary table format.
///
/// - File Header = Magic Bytes ("AODK") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"AODK";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of rows a single table may hold in one processing pass.
pub const MAX_TABLE_ROWS: usize = 10_000_000;

/// Number of particle species with a TPC n-sigma column.
pub const N_SPECIES: usize = 9;

/// Speed of light in cm/ps, for TOF beta.
pub const SPEED_OF_LIGHT_CM_PER_PS: f32 = 0.029_979_246;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of bins on a single histogram axis.
pub const MAX_AXIS_BINS: usize = 100_000;

/// Maximum length of a histogram name.
pub const MAX_HISTOGRAM_NAME_LENGTH: usize = 256;

/// Maximum size of a persisted table file, checked before decoding.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 512 * 1024 * 1024;
