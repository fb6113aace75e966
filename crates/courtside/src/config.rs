//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use courtside_transport::BackendConfig;

use crate::CourtsideError;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "COURTSIDE_API_URL";
/// Environment variable holding the request timeout, in whole seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "COURTSIDE_HTTP_TIMEOUT_SECS";
/// Environment variable holding the credential file path.
pub const ENV_STORAGE_PATH: &str = "COURTSIDE_STORAGE_PATH";

/// Settings for a [`CourtsideClient`](crate::CourtsideClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root the authentication endpoints hang off.
    pub api_base_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Where to cache credentials between runs. `None` keeps them in
    /// memory only, so every start is a fresh, anonymous one.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let backend = BackendConfig::default();
        Self {
            api_base_url: backend.base_url,
            request_timeout: backend.timeout,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `COURTSIDE_*` environment variables.
    ///
    /// # Errors
    /// [`CourtsideError::Config`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, CourtsideError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CourtsideError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CourtsideError::Config(format!(
                    "{ENV_API_URL}: expected an http(s) URL, got {url:?}"
                )));
            }
            config.api_base_url = url.to_string();
        }

        if let Some(secs) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                CourtsideError::Config(format!("{ENV_HTTP_TIMEOUT_SECS}: {e}"))
            })?;
            if secs == 0 {
                return Err(CourtsideError::Config(format!(
                    "{ENV_HTTP_TIMEOUT_SECS}: must be at least 1"
                )));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup(ENV_STORAGE_PATH).filter(|p| !p.trim().is_empty()) {
            config.storage_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// The transport half of this configuration.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.api_base_url.clone(),
            timeout: self.request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_matches_backend_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_config(), BackendConfig::default());
        assert_eq!(config.storage_path, None);
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://api.courtside.app/api"),
            (ENV_HTTP_TIMEOUT_SECS, "3"),
            (ENV_STORAGE_PATH, "/tmp/courtside/credentials.json"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.courtside.app/api");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(
            config.storage_path,
            Some(PathBuf::from("/tmp/courtside/credentials.json"))
        );
    }

    #[test]
    fn test_from_lookup_bad_timeout_is_config_error() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_HTTP_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, CourtsideError::Config(_)));
        assert!(err.to_string().contains(ENV_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn test_from_lookup_zero_timeout_rejected() {
        let err =
            ClientConfig::from_lookup(lookup(&[(ENV_HTTP_TIMEOUT_SECS, "0")])).unwrap_err();
        assert!(matches!(err, CourtsideError::Config(_)));
    }

    #[test]
    fn test_from_lookup_non_http_url_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "localhost:3000")]))
            .unwrap_err();
        assert!(matches!(err, CourtsideError::Config(_)));
    }

    #[test]
    fn test_from_lookup_blank_storage_path_means_memory() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_STORAGE_PATH, "  ")])).unwrap();
        assert_eq!(config.storage_path, None);
    }
}
