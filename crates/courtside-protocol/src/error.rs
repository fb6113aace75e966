//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding protocol values.
///
/// Each crate in Courtside defines its own error enum. When you see a
/// `ProtocolError`, the problem is in (de)serialization, not in the
/// network or in session bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// cached value written by an incompatible client version.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The encoded bytes are not valid UTF-8 and can't be stored as text.
    #[error("encoded value is not valid UTF-8")]
    NotUtf8,
}
