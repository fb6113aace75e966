//! Typed access to the cached credentials.

use courtside_protocol::{Codec, JsonCodec, TokenPair, UserProfile};
use tracing::{debug, warn};

use crate::{KeyValueStore, StorageKeys, StorageResult};

/// Everything the client remembers between runs.
///
/// Any field may be missing: a first launch has nothing, a user who
/// logged in through an older build may have tokens but no profile, and a
/// corrupt profile is reported as `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub cached_user: Option<UserProfile>,
}

impl PersistedCredentials {
    /// Credentials for an authenticated session.
    pub fn authenticated(tokens: &TokenPair, user: &UserProfile) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: tokens.refresh_token.clone(),
            cached_user: Some(user.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.cached_user.is_none()
    }
}

/// Reads and writes [`PersistedCredentials`] through a [`KeyValueStore`].
///
/// Values are JSON-encoded, one key each (see [`StorageKeys`]). Reads
/// never fail: a value that can't be read or decoded is logged and
/// reported as absent, because the worst a bad cache may do is force a
/// fresh login. Writes do report errors so the caller can log them.
#[derive(Debug)]
pub struct CredentialVault<S> {
    store: S,
    codec: JsonCodec,
}

impl<S: KeyValueStore> CredentialVault<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            codec: JsonCodec,
        }
    }

    /// The raw store underneath.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads all three values.
    pub fn load(&self) -> PersistedCredentials {
        PersistedCredentials {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
            cached_user: self.cached_user(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_token(StorageKeys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_token(StorageKeys::REFRESH_TOKEN)
    }

    /// The last user snapshot, or `None` if absent or unparsable.
    pub fn cached_user(&self) -> Option<UserProfile> {
        let raw = self.read_raw(StorageKeys::USER_DATA)?;
        match self.codec.decode::<UserProfile>(raw.as_bytes()) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "cached user snapshot is malformed, ignoring it");
                None
            }
        }
    }

    /// Mirrors `credentials` exactly: present fields are written, absent
    /// ones are removed so no stale value lingers.
    pub fn save(&self, credentials: &PersistedCredentials) -> StorageResult<()> {
        self.write_or_remove(
            StorageKeys::ACCESS_TOKEN,
            credentials.access_token.as_ref(),
        )?;
        self.write_or_remove(
            StorageKeys::REFRESH_TOKEN,
            credentials.refresh_token.as_ref(),
        )?;
        self.write_or_remove(
            StorageKeys::USER_DATA,
            credentials.cached_user.as_ref(),
        )?;
        debug!("credentials saved");
        Ok(())
    }

    /// Replaces only the cached user.
    pub fn save_user(&self, user: &UserProfile) -> StorageResult<()> {
        let encoded = self.codec.encode_to_string(user)?;
        self.store.set(StorageKeys::USER_DATA, &encoded)
    }

    /// Removes every credential key.
    ///
    /// Keeps going after a failed removal so one bad key can't leave the
    /// others behind; the first error is returned.
    pub fn clear(&self) -> StorageResult<()> {
        let mut first_error = None;
        for key in StorageKeys::ALL {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "failed to remove credential");
                first_error.get_or_insert(e);
            }
        }
        debug!("credentials cleared");
        first_error.map_or(Ok(()), Err)
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read credential");
                None
            }
        }
    }

    /// Tokens are stored as JSON strings, but a raw token written by an
    /// older build is accepted as-is.
    fn read_token(&self, key: &str) -> Option<String> {
        let raw = self.read_raw(key)?;
        let token = match self.codec.decode::<String>(raw.as_bytes()) {
            Ok(token) => token,
            Err(_) => {
                debug!(key, "token stored without JSON quoting");
                raw.trim().to_string()
            }
        };
        (!token.is_empty()).then_some(token)
    }

    fn write_or_remove<T: serde::Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
    ) -> StorageResult<()> {
        match value {
            Some(value) => {
                let encoded = self.codec.encode_to_string(value)?;
                self.store.set(key, &encoded)
            }
            None => self.store.remove(key).map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn user() -> UserProfile {
        let mut user = UserProfile::new("u-1", "ana@example.com");
        user.name = "Ana".into();
        user
    }

    fn vault() -> CredentialVault<MemoryStore> {
        CredentialVault::new(MemoryStore::new())
    }

    #[test]
    fn test_load_empty_store_returns_nothing() {
        assert!(vault().load().is_empty());
    }

    #[test]
    fn test_save_then_load_returns_same_credentials() {
        let vault = vault();
        let tokens = TokenPair::new("a-1", Some("r-1".into()));
        let saved = PersistedCredentials::authenticated(&tokens, &user());

        vault.save(&saved).unwrap();

        assert_eq!(vault.load(), saved);
    }

    #[test]
    fn test_values_are_json_encoded_under_well_known_keys() {
        let vault = vault();
        vault
            .save(&PersistedCredentials::authenticated(
                &TokenPair::new("a-1", None),
                &user(),
            ))
            .unwrap();

        let store = vault.store();
        assert_eq!(store.get("accessToken").unwrap().as_deref(), Some("\"a-1\""));
        assert!(store.get("userData").unwrap().unwrap().contains("\"email\""));
    }

    #[test]
    fn test_save_without_refresh_token_removes_stale_one() {
        let vault = vault();
        vault.store().set(StorageKeys::REFRESH_TOKEN, "\"old\"").unwrap();

        vault
            .save(&PersistedCredentials::authenticated(
                &TokenPair::new("a-2", None),
                &user(),
            ))
            .unwrap();

        assert_eq!(vault.refresh_token(), None);
    }

    #[test]
    fn test_malformed_user_is_treated_as_absent() {
        let vault = vault();
        vault.store().set(StorageKeys::ACCESS_TOKEN, "\"a-1\"").unwrap();
        vault.store().set(StorageKeys::USER_DATA, "{\"name\": 12").unwrap();

        let loaded = vault.load();

        assert_eq!(loaded.access_token.as_deref(), Some("a-1"));
        assert_eq!(loaded.cached_user, None);
    }

    #[test]
    fn test_raw_unquoted_token_is_accepted() {
        let vault = vault();
        vault.store().set(StorageKeys::ACCESS_TOKEN, "eyJhbGciOi.raw").unwrap();

        assert_eq!(vault.access_token().as_deref(), Some("eyJhbGciOi.raw"));
    }

    #[test]
    fn test_empty_token_is_absent() {
        let vault = vault();
        vault.store().set(StorageKeys::ACCESS_TOKEN, "\"\"").unwrap();

        assert_eq!(vault.access_token(), None);
    }

    #[test]
    fn test_clear_removes_everything_and_is_idempotent() {
        let vault = vault();
        vault
            .save(&PersistedCredentials::authenticated(
                &TokenPair::new("a-1", Some("r-1".into())),
                &user(),
            ))
            .unwrap();

        vault.clear().unwrap();
        vault.clear().unwrap();

        assert!(vault.load().is_empty());
        assert!(vault.store().is_empty());
    }

    #[test]
    fn test_save_user_keeps_tokens() {
        let vault = vault();
        vault.store().set(StorageKeys::ACCESS_TOKEN, "\"a-1\"").unwrap();
        let mut renamed = user();
        renamed.name = "Ana María".into();

        vault.save_user(&renamed).unwrap();

        assert_eq!(vault.access_token().as_deref(), Some("a-1"));
        assert_eq!(vault.cached_user().unwrap().name, "Ana María");
    }
}
