//! On-disk image of an engine.
//!
//! Layout: 4-byte magic, little-endian `u32` format version, little-endian `u32` CRC32 of the
//! payload, then the bincode-encoded [`DbImage`].

use crate::document::Document;
use crate::errors::DbError;
use crate::fsutil;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SNAPSHOT_MAGIC: [u8; 4] = *b"KTK1";
pub const SNAPSHOT_CURRENT_VERSION: u32 = 1;
const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionImage {
    pub name: String,
    pub unique_keys: Vec<String>,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbImage {
    pub collections: Vec<CollectionImage>,
}

/// # Errors
/// Returns an error if the image cannot be encoded.
pub fn encode_snapshot(image: &DbImage) -> Result<Vec<u8>, DbError> {
    let payload = encode_to_vec(image, standard())?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&SNAPSHOT_MAGIC);
    out.extend_from_slice(&SNAPSHOT_CURRENT_VERSION.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// # Errors
/// Returns `Snapshot` for a bad header, checksum mismatch or newer format, `Decode` for a bad payload.
pub fn decode_snapshot(bytes: &[u8]) -> Result<DbImage, DbError> {
    if bytes.len() < HEADER_LEN || bytes[0..4] != SNAPSHOT_MAGIC {
        return Err(DbError::Snapshot("missing or invalid snapshot magic".into()));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > SNAPSHOT_CURRENT_VERSION {
        return Err(DbError::Snapshot(format!(
            "snapshot format version {version} is newer than this build supports"
        )));
    }
    let expected = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let payload = &bytes[HEADER_LEN..];
    if crc32fast::hash(payload) != expected {
        return Err(DbError::Snapshot("checksum mismatch".into()));
    }
    let (image, _) = decode_from_slice::<DbImage, _>(payload, standard())?;
    Ok(image)
}

/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_snapshot(path: &Path) -> Result<DbImage, DbError> {
    let bytes = std::fs::read(path)?;
    decode_snapshot(&bytes)
}

/// # Errors
/// Returns an error if the image cannot be encoded or written.
pub fn write_snapshot(path: &Path, image: &DbImage) -> Result<(), DbError> {
    let bytes = encode_snapshot(image)?;
    fsutil::write_atomic(path, &bytes)?;
    Ok(())
}
