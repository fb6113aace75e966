//! Durable credential cache for the Courtside booking client.
//!
//! Two layers:
//!
//! 1. **Raw storage** ([`KeyValueStore`]): string keys to string values,
//!    the same shape as a browser's `localStorage`. [`MemoryStore`] for
//!    tests and throwaway sessions, [`FileStore`] for anything that must
//!    survive a restart.
//! 2. **Typed credentials** ([`CredentialVault`]): the access token,
//!    refresh token and cached user profile, JSON-encoded under the
//!    [`StorageKeys`].
//!
//! Whatever is in here is a *cache*: possibly stale, possibly missing,
//! possibly corrupt. The session layer re-validates it against the backend
//! on every start.

mod credentials;
mod error;
mod file;
mod keys;
mod memory;

pub use credentials::{CredentialVault, PersistedCredentials};
pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;

/// A synchronous string-to-string store.
///
/// Synchronous on purpose: every operation is a hash-map lookup or a small
/// file write, and the session applies them between suspension points.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads a value. `Ok(None)` if the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes (or overwrites) a value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes a value. Returns `true` if something was removed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Checks whether a key holds a value.
    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
