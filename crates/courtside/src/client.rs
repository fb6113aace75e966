//! `CourtsideClient` builder.
//!
//! Ties the layers together for the common case: HTTP backend, credential
//! cache on disk (or in memory), one [`AuthSession`] on top.

use std::path::PathBuf;
use std::time::Duration;

use courtside_session::AuthSession;
use courtside_storage::{FileStore, KeyValueStore, MemoryStore, StorageResult};
use courtside_transport::HttpBackend;
use tracing::info;

use crate::{ClientConfig, CourtsideError};

/// The session type applications use: HTTP backend, configurable cache.
pub type CourtsideClient = AuthSession<HttpBackend, ClientStore>;

/// Credential cache chosen at runtime from [`ClientConfig::storage_path`].
#[derive(Debug)]
pub enum ClientStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl KeyValueStore for ClientStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::File(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        match self {
            Self::Memory(store) => store.remove(key),
            Self::File(store) => store.remove(key),
        }
    }
}

/// Builder for a [`CourtsideClient`].
///
/// # Example
///
/// ```rust,ignore
/// let client = CourtsideClientBuilder::new()
///     .api_base_url("https://api.courtside.app/api")
///     .storage_path(dirs.data_dir().join("credentials.json"))
///     .build()?;
/// client.bootstrap().await?;
/// ```
pub struct CourtsideClientBuilder {
    config: ClientConfig,
}

impl CourtsideClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Caches credentials in a file at `path`.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = Some(path.into());
        self
    }

    /// Keeps credentials in memory only.
    pub fn in_memory(mut self) -> Self {
        self.config.storage_path = None;
        self
    }

    /// Opens the cache and creates the HTTP client. Nothing is sent yet;
    /// call [`AuthSession::bootstrap`] next.
    ///
    /// # Errors
    /// - [`CourtsideError::Storage`]: the cache file exists but can't be read
    /// - [`CourtsideError::Backend`]: the HTTP client couldn't be built
    pub fn build(self) -> Result<CourtsideClient, CourtsideError> {
        let store = match &self.config.storage_path {
            Some(path) => ClientStore::File(FileStore::open(path.clone())?),
            None => ClientStore::Memory(MemoryStore::new()),
        };
        let backend = HttpBackend::new(self.config.backend_config())?;

        info!(
            api = %self.config.api_base_url,
            persistent = self.config.storage_path.is_some(),
            "courtside client created"
        );
        Ok(AuthSession::new(backend, store))
    }
}

impl Default for CourtsideClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
