//! Value encoding for the credential cache.
//!
//! The storage crate writes tokens and the user snapshot through a
//! [`Codec`] rather than calling `serde_json` itself, so the on-disk format
//! is decided in one place.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns serde values into bytes and back.
///
/// Implementors are plain values held inside the credential vault, which
/// the session shares across tasks; hence `Send + Sync + 'static`.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes a value into a `String`, for text-only stores.
    ///
    /// # Errors
    /// Everything `encode` can return, plus `ProtocolError::NotUtf8`
    /// for binary formats.
    fn encode_to_string<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        String::from_utf8(self.encode(value)?)
            .map_err(|_| ProtocolError::NotUtf8)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what the backend speaks and what ends up in the credential
/// store, so a cached profile can be inspected with any text editor.
///
/// ## Example
///
/// ```rust
/// use courtside_protocol::{Codec, JsonCodec, TokenPair};
///
/// let codec = JsonCodec;
/// let tokens = TokenPair::new("access", Some("refresh".into()));
///
/// let bytes = codec.encode(&tokens).unwrap();
/// let decoded: TokenPair = codec.decode(&bytes).unwrap();
/// assert_eq!(tokens, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
