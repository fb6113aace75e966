//! Error types for the session layer.

use courtside_transport::BackendError;

/// Errors returned by session operations.
///
/// `Clone` because a single refresh outcome is handed to every caller
/// that joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a logged-in user and there isn't one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A refresh was requested but no refresh token exists anywhere.
    /// The session has been logged out.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The backend refused (or couldn't perform) the token exchange.
    /// The session has been logged out.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] BackendError),

    /// The session was logged out or replaced while this operation was
    /// waiting on the network, so its result was thrown away.
    #[error("session changed while the operation was in flight")]
    Superseded,

    /// `bootstrap` runs once per session.
    #[error("session already bootstrapped")]
    AlreadyBootstrapped,

    /// A backend call failed for a reason other than a refresh.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SessionError {
    /// `true` when the user has to log in again before anything else
    /// will work.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::NoRefreshToken | Self::RefreshFailed(_)
        )
    }
}
