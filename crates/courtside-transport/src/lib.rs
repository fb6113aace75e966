//! Backend abstraction layer for the Courtside booking client.
//!
//! Provides the [`AuthBackend`] trait covering the four authentication
//! endpoints the client depends on, and an HTTP implementation on top of
//! `reqwest`.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpBackend`] via `reqwest`

mod config;
mod error;
#[cfg(feature = "http")]
mod http;

pub use config::BackendConfig;
pub use error::BackendError;
#[cfg(feature = "http")]
pub use http::HttpBackend;

use std::future::Future;

use courtside_protocol::{AuthResponse, LoginRequest, UserProfile};

/// Paths of the authentication endpoints, relative to the API base URL.
pub mod endpoints {
    /// `POST {email, password}` → `{accessToken, refreshToken, user}`
    pub const LOGIN: &str = "/auth/login";
    /// `POST {refreshToken}` → `{accessToken, refreshToken, user}`
    pub const REFRESH: &str = "/auth/refresh";
    /// `POST`, best effort.
    pub const LOGOUT: &str = "/auth/logout";
    /// `GET` with `Authorization: Bearer <accessToken>` → `{user}`
    pub const CURRENT_USER: &str = "/users/me";
}

/// The backend operations the session layer needs.
///
/// The session never talks HTTP directly. Production code plugs in
/// [`HttpBackend`]; tests plug in a scripted mock that counts calls and
/// decides when each one resolves.
///
/// Every returned future is `Send` so the session can share an in-flight
/// refresh between tasks on a multi-threaded runtime.
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchanges email and password for a fresh session.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<AuthResponse, BackendError>> + Send;

    /// Asks the backend who owns `access_token`.
    ///
    /// # Returns
    /// - `Err(BackendError::Unauthorized)`: the token is expired or invalid
    /// - any other `Err`: the backend couldn't answer (outage, bad gateway)
    fn fetch_current_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;

    /// Exchanges a refresh token for a new credential pair.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<AuthResponse, BackendError>> + Send;

    /// Tells the backend the session is over. Best effort.
    fn logout(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}
