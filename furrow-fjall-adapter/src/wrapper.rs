use furrow::errors::{ErrorKind, FurrowError};
use furrow::migration::Version;
use std::error::Error;
use thiserror::Error;

/// Length in bytes of an encoded version key.
pub const VERSION_KEY_LEN: usize = 8;

const SIGN_BIT: u64 = 1 << 63;

/// Error type for decoding version keys read back from a partition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersionKeyError {
    /// The key does not have the fixed encoded length
    #[error("Invalid version key length: expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },
}

impl From<VersionKeyError> for FurrowError {
    fn from(err: VersionKeyError) -> Self {
        FurrowError::new(&err.to_string(), ErrorKind::EncodingError)
    }
}

pub type VersionKeyResult<T> = Result<T, VersionKeyError>;

/// Encodes a version as an 8-byte key whose byte order matches the numeric
/// order of versions, negative ones included.
#[inline]
pub fn encode_version(version: Version) -> [u8; VERSION_KEY_LEN] {
    ((version as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Decodes a key produced by [`encode_version`].
#[inline]
pub fn decode_version(key: &[u8]) -> VersionKeyResult<Version> {
    let bytes: [u8; VERSION_KEY_LEN] = key.try_into().map_err(|_| VersionKeyError::InvalidLength {
        expected: VERSION_KEY_LEN,
        found: key.len(),
    })?;
    Ok((u64::from_be_bytes(bytes) ^ SIGN_BIT) as Version)
}

/// Maps a fjall error onto a [`FurrowError`] by its message.
pub(crate) fn to_furrow_error(error: impl Error) -> FurrowError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") {
        ErrorKind::StoreAlreadyClosed
    } else if error_msg.contains("deleted") || error_msg.contains("PartitionDeleted") {
        ErrorKind::StoreNotInitialized
    } else if error_msg.contains("corrupt") || error_msg.contains("Decode") {
        ErrorKind::EncodingError
    } else if error_msg.contains("Io") || error_msg.contains("os error") {
        ErrorKind::IOError
    } else {
        ErrorKind::Extension("fjall".to_string())
    };
    FurrowError::new(&format!("Fjall Error: {}", error_msg), error_kind)
}
