//! # Persistence Format
//!
//! Binary serialization for the cluster tables of one processing pass.
//! File I/O is in the app layer.
//!
//! Format: Header (5 bytes) + postcard-serialized tables.
//! - 4 bytes: Magic ("AODK")
//! - 1 byte: Version
//!
//! ## Validation
//!
//! Size and header are checked before the payload is decoded, and every
//! decoded row goes back through the table writer, so a file that breaks
//! the reference or association invariants is rejected rather than loaded.

use crate::primitives::{self, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::table::{ClusterTables, SerializableTable};
use crate::{AodError, AssociationKind};
use serde::{Deserialize, Serialize};

/// Minimum valid file size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all table data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), AodError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(AodError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(AodError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AodError> {
        if bytes.len() < MIN_FILE_SIZE {
            return Err(AodError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

/// Both tables of a pass in their storable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableTables {
    pub matched: SerializableTable,
    pub ambiguous: SerializableTable,
}

impl From<&ClusterTables> for SerializableTables {
    fn from(tables: &ClusterTables) -> Self {
        Self {
            matched: SerializableTable::from(&tables.matched),
            ambiguous: SerializableTable::from(&tables.ambiguous),
        }
    }
}

impl SerializableTables {
    /// Rebuild both tables, checking that each sits in its own slot.
    pub fn into_tables(self) -> Result<ClusterTables, AodError> {
        if self.matched.kind != AssociationKind::Collision
            || self.ambiguous.kind != AssociationKind::BunchCrossing
        {
            return Err(AodError::DeserializationError(
                "table kinds do not match their slots".to_string(),
            ));
        }
        Ok(ClusterTables {
            matched: self.matched.into_table()?,
            ambiguous: self.ambiguous.into_table()?,
        })
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize the tables to bytes (header + payload).
pub fn tables_to_bytes(tables: &ClusterTables) -> Result<Vec<u8>, AodError> {
    let header = PersistenceHeader::new();
    let serializable = SerializableTables::from(tables);

    let payload = postcard::to_stdvec(&serializable)
        .map_err(|e| AodError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize tables from bytes.
///
/// Checks, in order: minimum size, maximum size, header, then decodes the
/// payload and re-validates every row.
pub fn tables_from_bytes(bytes: &[u8]) -> Result<ClusterTables, AodError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(AodError::DeserializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(AodError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let serializable: SerializableTables =
        postcard::from_bytes(&bytes[MIN_FILE_SIZE..]).map_err(|e| {
            AodError::DeserializationError(format!("Failed to decode table data: {e}"))
        })?;

    serializable.into_tables()
}

// =============================================================================
// CRYPTOGRAPHIC DIGEST
// =============================================================================

/// BLAKE3 digest of raw bytes, as a 64-character hex string.
///
/// Only available with the `crypto-hash` feature.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn compute_blake3_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// BLAKE3 digest of the encoded form of the tables.
///
/// Encoding is deterministic, so equal tables hash equally.
#[cfg(feature = "crypto-hash")]
pub fn tables_crypto_hash(tables: &ClusterTables) -> Result<String, AodError> {
    Ok(compute_blake3_hash(&tables_to_bytes(tables)?))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Association, ClusterRecord};
    use crate::table::ClusterPass;
    use crate::{BcId, CollisionId, DefinitionId};

    fn record(id: i32) -> ClusterRecord {
        ClusterRecord {
            id,
            energy: 1.5,
            core_energy: 1.2,
            eta: -0.2,
            phi: 3.0,
            m02: 0.4,
            m20: 0.2,
            n_cells: 6,
            time: -3.0,
            is_exotic: false,
            distance_to_bad_channel: 1.0,
            nlm: 2,
            definition: DefinitionId(10),
        }
    }

    fn sample_tables() -> ClusterTables {
        let mut pass = ClusterPass::new(2, 4);
        pass.append(Association::Collision(CollisionId(1)), record(1))
            .expect("append");
        pass.append(Association::BunchCrossing(BcId(3)), record(2))
            .expect("append");
        pass.append(Association::Collision(CollisionId(0)), record(3))
            .expect("append");
        pass.finish()
    }

    #[test]
    fn header_roundtrip() {
        let header = PersistenceHeader::new();
        let restored = PersistenceHeader::from_bytes(&header.to_bytes()).expect("parse header");
        assert_eq!(restored, header);
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let tables = sample_tables();
        let bytes1 = tables_to_bytes(&tables).expect("first serialize");
        let restored = tables_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = tables_to_bytes(&restored).expect("second serialize");

        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
        assert_eq!(restored.matched.len(), 2);
        assert_eq!(restored.ambiguous.len(), 1);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");
        assert!(tables_from_bytes(&bytes).is_err());
    }

    #[test]
    fn wrong_version_rejected() {
        let mut bytes = tables_to_bytes(&sample_tables()).expect("serialize");
        bytes[4] = primitives::FORMAT_VERSION + 1;
        assert!(matches!(
            tables_from_bytes(&bytes),
            Err(AodError::DeserializationError(_))
        ));
    }

    #[test]
    fn truncated_payload_rejected() {
        let bytes = tables_to_bytes(&sample_tables()).expect("serialize");
        assert!(tables_from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn swapped_tables_rejected() {
        let tables = sample_tables();
        let swapped = SerializableTables {
            matched: SerializableTable::from(&tables.ambiguous),
            ambiguous: SerializableTable::from(&tables.matched),
        };
        assert!(swapped.into_tables().is_err());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn crypto_hash_is_stable() {
        let a = tables_crypto_hash(&sample_tables()).expect("hash");
        let b = tables_crypto_hash(&sample_tables()).expect("hash");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
