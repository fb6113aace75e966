//! [`AuthBackend`] over HTTP, using `reqwest`.

use courtside_protocol::{
    AuthResponse, CurrentUserResponse, LoginRequest, RefreshRequest,
    UserProfile,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{AuthBackend, BackendConfig, BackendError, endpoints};

/// Talks to the booking backend's authentication endpoints.
///
/// Cloning is cheap: `reqwest::Client` is an `Arc` around a connection
/// pool, so clones share connections.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    /// Returns [`BackendError::Config`] if the TLS backend can't be
    /// initialised.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Turns a non-success response into a classified error, reading the
    /// body for a human-readable message.
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        debug!(status = status.as_u16(), %message, "backend rejected request");
        Err(BackendError::from_status(status.as_u16(), message))
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl AuthBackend for HttpBackend {
    async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<AuthResponse, BackendError> {
        debug!(email = %request.email, "POST {}", endpoints::LOGIN);
        let response = self
            .client
            .post(self.config.url(endpoints::LOGIN))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn fetch_current_user(
        &self,
        access_token: &str,
    ) -> Result<UserProfile, BackendError> {
        debug!("GET {}", endpoints::CURRENT_USER);
        let response = self
            .client
            .get(self.config.url(endpoints::CURRENT_USER))
            .bearer_auth(access_token)
            .send()
            .await?;
        let body: CurrentUserResponse = Self::read_json(response).await?;
        Ok(body.into_user())
    }

    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<AuthResponse, BackendError> {
        debug!("POST {}", endpoints::REFRESH);
        let response = self
            .client
            .post(self.config.url(endpoints::REFRESH))
            .json(&RefreshRequest {
                refresh_token: refresh_token.to_string(),
            })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn logout(&self, access_token: &str) -> Result<(), BackendError> {
        debug!("POST {}", endpoints::LOGOUT);
        let response = self
            .client
            .post(self.config.url(endpoints::LOGOUT))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

/// Pulls `message` (or `error`) out of a JSON error body, falling back
/// to the raw text when it isn't JSON.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) =
        serde_json::from_str::<serde_json::Value>(trimmed)
    {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = map.get(key) {
                return Some(msg.clone());
            }
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_json_message_field() {
        let body = r#"{"message":"Refresh token revoked","code":42}"#;
        assert_eq!(error_message(body).as_deref(), Some("Refresh token revoked"));
    }

    #[test]
    fn test_error_message_falls_back_to_error_field() {
        assert_eq!(
            error_message(r#"{"error":"jwt expired"}"#).as_deref(),
            Some("jwt expired")
        );
    }

    #[test]
    fn test_error_message_plain_text_and_empty() {
        assert_eq!(error_message("Bad Gateway\n").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn test_new_keeps_config() {
        let backend = HttpBackend::new(BackendConfig::new("http://127.0.0.1:1")).unwrap();
        assert_eq!(backend.config().base_url, "http://127.0.0.1:1");
    }
}
