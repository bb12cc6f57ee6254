//! Binary encoding of store snapshots.
//!
//! Provides postcard encode/decode for a [`Snapshot`], along with a
//! headered variant used for snapshot files on disk.

use crate::user::Snapshot;

/// Magic bytes at the start of every snapshot file.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"TBSN";

/// Current snapshot file format version.
pub const SNAPSHOT_VERSION: u16 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 2;

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The file header is missing, has the wrong magic, or an unknown version.
    #[error("invalid snapshot header: {0}")]
    InvalidHeader(String),
}

/// Encodes a [`Snapshot`] into a byte vector using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`Snapshot`] from a byte slice using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes cannot be deserialized.
pub fn decode(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Encodes a [`Snapshot`] with the file header.
///
/// File format: `[magic "TBSN"][u16 version (LE)][postcard payload]`
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized.
pub fn encode_file(snapshot: &Snapshot) -> Result<Vec<u8>, CodecError> {
    let payload = encode(snapshot)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SNAPSHOT_MAGIC);
    bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decodes a headered snapshot file back into a [`Snapshot`].
///
/// # Errors
///
/// Returns `CodecError::InvalidHeader` if the input is too short, the
/// magic does not match, or the version is unsupported, and
/// `CodecError::Serialization` if the payload cannot be deserialized.
pub fn decode_file(bytes: &[u8]) -> Result<Snapshot, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::InvalidHeader(format!(
            "need at least {HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(CodecError::InvalidHeader("bad magic".to_string()));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != SNAPSHOT_VERSION {
        return Err(CodecError::InvalidHeader(format!(
            "unsupported version {version}"
        )));
    }
    decode(payload)
}
