//! Error types for the storage layer.

use courtside_protocol::ProtocolError;

/// Errors that can occur while reading or writing cached credentials.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing file couldn't be read, written or renamed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// A value couldn't be encoded for storage.
    #[error(transparent)]
    Encoding(#[from] ProtocolError),

    /// A lock guarding the store was poisoned by a panicking thread.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
