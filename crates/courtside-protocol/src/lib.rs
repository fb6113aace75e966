//! Wire types for the Courtside booking client.
//!
//! This crate defines the data the client exchanges with the backend and
//! keeps on disk:
//!
//! - **Types** ([`UserProfile`], [`UserPatch`], [`TokenPair`], request and
//!   response bodies): what travels over HTTP and what gets cached.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (HTTP) ─┐
//!                   ├─→ Protocol (UserProfile, TokenPair) ─→ Session
//! Storage (disk) ───┘
//! ```
//!
//! The protocol layer knows nothing about sessions, token lifecycles or
//! HTTP. It only knows what the values look like.

mod codec;
mod error;
mod types;

pub use codec::Codec;
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AuthResponse, CurrentUserResponse, LoginRequest, RefreshRequest,
    TokenPair, UserPatch, UserProfile, UserRole,
};
