//! # Formats
//!
//! On-disk encodings of core data.

pub mod persistence;

#[cfg(feature = "crypto-hash")]
pub use persistence::{compute_blake3_hash, tables_crypto_hash};
pub use persistence::{PersistenceHeader, SerializableTables, tables_from_bytes, tables_to_bytes};
