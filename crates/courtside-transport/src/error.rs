//! Error types for the backend layer.

/// Errors returned by an [`AuthBackend`](crate::AuthBackend).
///
/// The session layer cares about one distinction above all others:
/// *authorization* failures (the credential is bad, try a refresh) versus
/// *everything else* (the backend is unreachable, keep the credential).
/// [`is_authorization`](Self::is_authorization) draws that line.
///
/// `Clone` because one refresh result is handed to every caller that
/// joined it; that's also why transport errors are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered 401 or 403.
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The backend answered with some other non-success status.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never got an answer: connection refused, DNS failure,
    /// timeout, TLS error.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered 2xx but the body didn't parse.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The client itself is misconfigured (bad base URL, TLS setup).
    #[error("backend configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            _ => Self::Rejected { status, message },
        }
    }

    /// `true` for expired or invalid credentials.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The HTTP status, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status, .. } | Self::Rejected { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
