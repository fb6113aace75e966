//! Single-flight access token refresh.
//!
//! When an access token expires, every request that was using it fails
//! with a 401 at roughly the same time. Each of those callers asks for a
//! refresh, but the backend must see exactly one exchange: refresh tokens
//! rotate, so a second exchange with the same token would be rejected
//! and log the user out.
//!
//! # How
//!
//! The first caller builds the exchange as a [`Shared`] future and parks
//! it in `in_flight`. Later callers find it there and await a clone.
//! `Shared` polls the underlying future once and hands every clone the
//! same (cloned) output, so all callers see the same result. The slot is
//! emptied when the exchange settles, after its result is committed.
//!
//! The slot also records the epoch the exchange started in. A caller from
//! a later epoch never joins an older exchange: it waits for that one to
//! settle and then starts its own, so there is still at most one exchange
//! on the wire.
//!
//! # Epochs
//!
//! Every explicit session change (`login`, `sign_in`, `logout`) advances
//! the session epoch. An exchange remembers the epoch it started in; if
//! the epoch has moved by the time it settles, its result is dropped
//! without touching state, storage or listeners, and callers get
//! [`SessionError::Superseded`]. A refresh that succeeds after the user
//! logged out doesn't log them back in, and one that fails after they
//! signed in again doesn't log them out.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use courtside_protocol::{AuthResponse, TokenPair};
use courtside_storage::{CredentialVault, KeyValueStore, PersistedCredentials};
use courtside_transport::AuthBackend;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::{Action, AuthEvent, Broadcaster, SessionError, SessionStore};

type RefreshResult = Result<TokenPair, SessionError>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshResult>>;

struct InFlight {
    epoch: u64,
    exchange: SharedRefresh,
}

/// Exchanges the refresh token for new credentials, at most once at a
/// time.
pub struct RefreshCoordinator<B, S> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    vault: Arc<CredentialVault<S>>,
    events: Arc<Broadcaster>,
    in_flight: Mutex<Option<InFlight>>,
    epoch: AtomicU64,
}

impl<B: AuthBackend, S: KeyValueStore> RefreshCoordinator<B, S> {
    pub(crate) fn new(
        backend: Arc<B>,
        store: Arc<SessionStore>,
        vault: Arc<CredentialVault<S>>,
        events: Arc<Broadcaster>,
    ) -> Self {
        Self {
            backend,
            store,
            vault,
            events,
            in_flight: Mutex::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Starts an exchange, or joins the one already running.
    ///
    /// On success the new credentials are committed to the store and the
    /// vault, and [`AuthEvent::TokenRefreshed`] is published. On failure
    /// the session is logged out, the vault cleared, and
    /// [`AuthEvent::TokenRefreshFailed`] published. Either way, exactly
    /// once per exchange no matter how many callers joined.
    ///
    /// # Errors
    /// - [`SessionError::NoRefreshToken`]: nothing to exchange
    /// - [`SessionError::RefreshFailed`]: the backend said no
    /// - [`SessionError::Superseded`]: the session changed mid-exchange
    pub async fn refresh(self: &Arc<Self>) -> RefreshResult {
        loop {
            let (exchange, current) = self.join_or_start();
            let result = exchange.await;
            if current {
                return result;
            }
        }
    }

    /// Returns the exchange to await and whether it belongs to the
    /// current epoch. A stale one must be awaited and then retried.
    fn join_or_start(self: &Arc<Self>) -> (SharedRefresh, bool) {
        let mut slot = lock(&self.in_flight);
        let epoch = self.current_epoch();
        match slot.as_ref() {
            Some(pending) if pending.epoch == epoch => {
                debug!("joining in-flight token refresh");
                (pending.exchange.clone(), true)
            }
            Some(pending) => {
                debug!(
                    stale_epoch = pending.epoch,
                    epoch, "waiting for a superseded token refresh to settle"
                );
                (pending.exchange.clone(), false)
            }
            None => {
                let this = Arc::clone(self);
                let exchange = async move { this.run(epoch).await }.boxed().shared();
                *slot = Some(InFlight {
                    epoch,
                    exchange: exchange.clone(),
                });
                (exchange, true)
            }
        }
    }

    /// `true` while an exchange is outstanding.
    pub fn is_in_flight(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Invalidates any exchange started before now.
    pub(crate) fn advance_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn run(self: Arc<Self>, epoch: u64) -> RefreshResult {
        let outcome = self.exchange().await;
        let result = self.settle(epoch, outcome);
        lock(&self.in_flight).take();
        result
    }

    /// The network half: find a refresh token and trade it in.
    ///
    /// Returns the response together with the token that was spent, for
    /// backends that don't rotate it.
    async fn exchange(&self) -> Result<(AuthResponse, String), SessionError> {
        let refresh_token = self
            .store
            .read(|s| s.refresh_token().map(str::to_owned))
            .or_else(|| self.vault.refresh_token())
            .ok_or(SessionError::NoRefreshToken)?;

        info!("refreshing access token");
        let response = self
            .backend
            .refresh(&refresh_token)
            .await
            .map_err(SessionError::RefreshFailed)?;
        Ok((response, refresh_token))
    }

    /// The synchronous half: commit the outcome everywhere.
    fn settle(
        &self,
        epoch: u64,
        outcome: Result<(AuthResponse, String), SessionError>,
    ) -> RefreshResult {
        if self.current_epoch() != epoch {
            info!(
                succeeded = outcome.is_ok(),
                "session changed during token refresh, discarding result"
            );
            return Err(SessionError::Superseded);
        }

        match outcome {
            Ok((response, spent)) => {
                let AuthResponse {
                    access_token,
                    refresh_token,
                    user,
                } = response;
                let tokens = TokenPair::new(access_token, refresh_token.or(Some(spent)));

                if let Err(e) = self
                    .vault
                    .save(&PersistedCredentials::authenticated(&tokens, &user))
                {
                    warn!(error = %e, "failed to persist refreshed credentials");
                }
                self.store.dispatch(Action::LoginSuccess {
                    user: user.clone(),
                    tokens: tokens.clone(),
                });
                self.events.publish(&AuthEvent::TokenRefreshed {
                    access_token: tokens.access_token.clone(),
                    refresh_token: tokens.refresh_token.clone(),
                    user,
                });
                info!("access token refreshed");
                Ok(tokens)
            }
            Err(err) => {
                warn!(error = %err, "token refresh failed, logging out");
                if let Err(e) = self.vault.clear() {
                    warn!(error = %e, "failed to clear credentials after refresh failure");
                }
                self.store.dispatch(Action::Logout);
                self.events.publish(&AuthEvent::TokenRefreshFailed);
                Err(err)
            }
        }
    }
}

impl<B, S> fmt::Debug for RefreshCoordinator<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &lock(&self.in_flight).is_some())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
