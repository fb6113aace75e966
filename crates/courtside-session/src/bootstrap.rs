//! Once-per-start reconciliation of cached credentials with the backend.
//!
//! The cache says who was logged in last time. The backend says whether
//! that is still true. Bootstrap asks, and picks one of three paths:
//!
//! ```text
//!                      ┌─ ok ──────────────→ Restored
//! cached access token ─┼─ 401/403 ─┬─ refresh token → refresh → Refreshed | RefreshFailed
//!        │             │           └─ none ─────────────────────→ Rejected
//!        │             └─ outage ──┬─ cached user ──────────────→ Offline
//!        │                         └─ none ─────────────────────→ Unreachable
//!        └─ none ──────────────────────────────────────────────→ Anonymous
//! ```
//!
//! The outage path keeps the user logged in on stale data rather than
//! bouncing them to the login screen every time the network blips.
//!
//! A `login`, `sign_in` or `logout` made while bootstrap waits on the
//! backend wins: bootstrap then commits nothing, not even the final
//! `SetLoading(false)`, and reports [`BootstrapOutcome::Superseded`].

use std::sync::Arc;

use courtside_storage::{CredentialVault, KeyValueStore};
use courtside_protocol::TokenPair;
use courtside_transport::AuthBackend;
use tracing::{info, warn};

use crate::{Action, RefreshCoordinator, SessionError, SessionStore};

/// How bootstrap ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Nothing cached; nobody is logged in.
    Anonymous,
    /// The cached access token is still good.
    Restored,
    /// The access token had expired and a refresh replaced it.
    Refreshed,
    /// The access token had expired and the refresh was refused.
    RefreshFailed,
    /// The access token was refused and there was no refresh token.
    Rejected,
    /// The backend was unreachable; the cached user is shown meanwhile.
    Offline,
    /// The backend was unreachable and no cached user exists. Stored
    /// credentials are kept for the next start.
    Unreachable,
    /// The session was changed explicitly while bootstrap was waiting on
    /// the backend; that change stands and bootstrap left everything alone.
    Superseded,
}

impl BootstrapOutcome {
    /// `true` if bootstrap itself left the session authenticated.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Restored | Self::Refreshed | Self::Offline)
    }
}

pub(crate) struct Bootstrapper<'a, B, S> {
    pub(crate) backend: &'a B,
    pub(crate) store: &'a SessionStore,
    pub(crate) vault: &'a CredentialVault<S>,
    pub(crate) refresh: &'a Arc<RefreshCoordinator<B, S>>,
}

impl<B: AuthBackend, S: KeyValueStore> Bootstrapper<'_, B, S> {
    pub(crate) async fn run(self) -> BootstrapOutcome {
        let epoch = self.refresh.current_epoch();
        let outcome = self.reconcile(epoch).await;
        if outcome != BootstrapOutcome::Superseded {
            self.store.dispatch(Action::SetLoading(false));
        }
        info!(?outcome, "session bootstrap finished");
        outcome
    }

    async fn reconcile(&self, epoch: u64) -> BootstrapOutcome {
        let cached = self.vault.load();
        let Some(access_token) = cached.access_token else {
            return BootstrapOutcome::Anonymous;
        };

        let fetched = self.backend.fetch_current_user(&access_token).await;
        if self.refresh.current_epoch() != epoch {
            info!("session changed during bootstrap, discarding result");
            return BootstrapOutcome::Superseded;
        }

        match fetched {
            Ok(user) => {
                if let Err(e) = self.vault.save_user(&user) {
                    warn!(error = %e, "failed to cache user snapshot");
                }
                self.store.dispatch(Action::LoginSuccess {
                    user,
                    tokens: TokenPair::new(access_token, cached.refresh_token),
                });
                BootstrapOutcome::Restored
            }
            Err(err) if err.is_authorization() => {
                if cached.refresh_token.is_some() {
                    info!("stored access token rejected, trying refresh");
                    match self.refresh.refresh().await {
                        Ok(_) => BootstrapOutcome::Refreshed,
                        Err(SessionError::Superseded) => BootstrapOutcome::Superseded,
                        Err(_) => BootstrapOutcome::RefreshFailed,
                    }
                } else {
                    info!(error = %err, "stored access token rejected, no refresh token");
                    if let Err(e) = self.vault.clear() {
                        warn!(error = %e, "failed to clear rejected credentials");
                    }
                    self.store.dispatch(Action::LoginFailure(err.to_string()));
                    BootstrapOutcome::Rejected
                }
            }
            Err(err) => match cached.cached_user {
                Some(user) => {
                    warn!(error = %err, "backend unreachable, using cached user");
                    self.store.dispatch(Action::LoginSuccess {
                        user,
                        tokens: TokenPair::new(access_token, cached.refresh_token),
                    });
                    BootstrapOutcome::Offline
                }
                None => {
                    warn!(error = %err, "backend unreachable and no cached user");
                    self.store.dispatch(Action::LoginFailure(err.to_string()));
                    BootstrapOutcome::Unreachable
                }
            },
        }
    }
}
