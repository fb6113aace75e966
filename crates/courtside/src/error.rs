//! Unified error type for the Courtside client.

use courtside_protocol::ProtocolError;
use courtside_session::SessionError;
use courtside_storage::StorageError;
use courtside_transport::BackendError;

/// Top-level error that wraps all crate-specific errors.
///
/// Application code using the `courtside` facade deals with this one type.
/// The `#[from]` variants let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CourtsideError {
    /// A backend call failed (network, status, body).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Encoding or decoding a wire value failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session operation failed (not logged in, refresh refused).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The credential cache couldn't be opened or written.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The tracing subscriber couldn't be installed.
    #[error("failed to initialize tracing: {0}")]
    Telemetry(String),
}

impl CourtsideError {
    /// `true` if the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Session(e) if e.requires_login())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_backend_error() {
        let err = BackendError::Network("connection refused".into());
        let courtside_err: CourtsideError = err.into();
        assert!(matches!(courtside_err, CourtsideError::Backend(_)));
        assert!(courtside_err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::NotUtf8;
        let courtside_err: CourtsideError = err.into();
        assert!(matches!(courtside_err, CourtsideError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::NoRefreshToken;
        let courtside_err: CourtsideError = err.into();
        assert!(matches!(courtside_err, CourtsideError::Session(_)));
        assert!(courtside_err.requires_login());
    }

    #[test]
    fn test_from_storage_error() {
        let err = StorageError::Poisoned;
        let courtside_err: CourtsideError = err.into();
        assert!(matches!(courtside_err, CourtsideError::Storage(_)));
        assert!(!courtside_err.requires_login());
    }

    #[test]
    fn test_config_error_message() {
        let err = CourtsideError::Config("COURTSIDE_HTTP_TIMEOUT_SECS: not a number".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: COURTSIDE_HTTP_TIMEOUT_SECS: not a number"
        );
    }
}
