//! Backend connection settings.

use std::time::Duration;

/// Where the backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// API root, e.g. `https://api.courtside.app/api`. A trailing slash
    /// is tolerated.
    pub base_url: String,

    /// Per-request timeout. A request that hits it surfaces as
    /// [`BackendError::Network`](crate::BackendError::Network), which the
    /// session treats as a transient outage.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Joins the base URL and an endpoint path without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = BackendConfig::new("https://api.example.com/api/");
        assert_eq!(
            config.url("/users/me"),
            "https://api.example.com/api/users/me"
        );
    }

    #[test]
    fn test_default_points_at_local_backend() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
