//! The session service: the one object the rest of the client talks to.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use courtside_protocol::{LoginRequest, TokenPair, UserPatch, UserProfile};
use courtside_storage::{CredentialVault, KeyValueStore, PersistedCredentials};
use courtside_transport::{AuthBackend, BackendError};
use tracing::{debug, info, warn};

use crate::bootstrap::Bootstrapper;
use crate::{
    Action, BootstrapOutcome, Broadcaster, RefreshCoordinator, SessionError,
    SessionState, SessionStore, SubscriptionId,
};

struct Inner<B, S> {
    backend: Arc<B>,
    store: Arc<SessionStore>,
    vault: Arc<CredentialVault<S>>,
    events: Arc<Broadcaster>,
    refresh: Arc<RefreshCoordinator<B, S>>,
    bootstrapped: AtomicBool,
}

/// Owns the client's authentication session.
///
/// Build one at startup and hand clones to whatever needs it; clones
/// share everything. There is deliberately no global instance.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ bootstrap() ──→ [authenticated | anonymous]
///                                 │
///   sign_in() / login() ──────────┤
///   refresh_access_token() ───────┤  (on 401 from any request)
///   logout() ─────────────────────┘
/// ```
///
/// ## Example
///
/// ```rust,ignore
/// let session = AuthSession::new(HttpBackend::new(config)?, FileStore::open(path)?);
/// session.subscribe(|state| render(state));
/// session.bootstrap().await?;
///
/// let courts = session
///     .with_auth_retry(|token| api.list_courts(token))
///     .await?;
/// ```
pub struct AuthSession<B, S> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for AuthSession<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: AuthBackend, S: KeyValueStore> AuthSession<B, S> {
    /// Creates a session in the initial (`loading`) state. Nothing is
    /// read or fetched until [`bootstrap`](Self::bootstrap).
    pub fn new(backend: B, storage: S) -> Self {
        let backend = Arc::new(backend);
        let store = Arc::new(SessionStore::new());
        let vault = Arc::new(CredentialVault::new(storage));
        let events = Arc::new(Broadcaster::new());
        let refresh = Arc::new(RefreshCoordinator::new(
            Arc::clone(&backend),
            Arc::clone(&store),
            Arc::clone(&vault),
            Arc::clone(&events),
        ));
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                vault,
                events,
                refresh,
                bootstrapped: AtomicBool::new(false),
            }),
        }
    }

    // -- Reading ----------------------------------------------------------

    /// A copy of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.store.state()
    }

    /// Calls `listener` with the new state after every transition.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    /// The token lifecycle event channel.
    pub fn events(&self) -> &Broadcaster {
        &self.inner.events
    }

    pub fn vault(&self) -> &CredentialVault<S> {
        &self.inner.vault
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// `true` while a token refresh is outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_in_flight()
    }

    /// The access token to send with the next request: the session's if
    /// it has one, otherwise whatever is cached.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .store
            .read(|s| s.access_token().map(str::to_owned))
            .or_else(|| self.inner.vault.access_token())
    }

    // -- Lifecycle --------------------------------------------------------

    /// Reconciles cached credentials with the backend. Call once at
    /// startup, before rendering anything that depends on who is logged
    /// in; `loading` stays `true` until this returns.
    ///
    /// # Errors
    /// [`SessionError::AlreadyBootstrapped`] on a second call. Backend
    /// failures are not errors here: they are folded into the
    /// [`BootstrapOutcome`].
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome, SessionError> {
        if self.inner.bootstrapped.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyBootstrapped);
        }
        let outcome = Bootstrapper {
            backend: self.inner.backend.as_ref(),
            store: &self.inner.store,
            vault: &self.inner.vault,
            refresh: &self.inner.refresh,
        }
        .run()
        .await;
        Ok(outcome)
    }

    /// Logs in with email and password.
    ///
    /// # Errors
    /// - [`SessionError::Backend`]: the backend refused; the session is
    ///   now logged out with the message in `error`
    /// - [`SessionError::Superseded`]: `logout` or another login
    ///   happened while waiting; nothing was committed
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, SessionError> {
        let epoch = self.inner.refresh.advance_epoch();
        self.inner.store.dispatch(Action::LoginStart);

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let result = self.inner.backend.login(&request).await;

        if self.inner.refresh.current_epoch() != epoch {
            debug!("session changed during sign-in, discarding result");
            return Err(SessionError::Superseded);
        }
        match result {
            Ok(response) => {
                let tokens = response.tokens();
                self.commit_login(response.user.clone(), tokens);
                Ok(response.user)
            }
            Err(err) => {
                info!(error = %err, "sign-in failed");
                if let Err(e) = self.inner.vault.clear() {
                    warn!(error = %e, "failed to clear credentials");
                }
                self.inner
                    .store
                    .dispatch(Action::LoginFailure(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Records a login performed elsewhere (e.g. a sign-up flow that
    /// returns a session).
    ///
    /// Without `tokens`, the ones already held by the session or the
    /// cache are used.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] if no access token is given or
    /// known: an authenticated session without one can't exist.
    pub fn login(
        &self,
        user: UserProfile,
        tokens: Option<TokenPair>,
    ) -> Result<(), SessionError> {
        let tokens = tokens
            .or_else(|| self.inner.store.read(SessionState::tokens))
            .or_else(|| {
                let access = self.inner.vault.access_token()?;
                Some(TokenPair::new(access, self.inner.vault.refresh_token()))
            })
            .ok_or(SessionError::NotAuthenticated)?;

        self.inner.refresh.advance_epoch();
        self.commit_login(user, tokens);
        Ok(())
    }

    /// Ends the session.
    ///
    /// Local state and cache are cleared first, so the UI updates at
    /// once; the backend is told afterwards, and a failure there is only
    /// logged. Calling it again is harmless. A refresh still in flight
    /// settles as [`SessionError::Superseded`] and changes nothing.
    pub async fn logout(&self) {
        self.inner.refresh.advance_epoch();
        let access_token = self.access_token();

        if let Err(e) = self.inner.vault.clear() {
            warn!(error = %e, "failed to clear credentials on logout");
        }
        self.inner.store.dispatch(Action::Logout);
        info!("logged out");

        if let Some(token) = access_token {
            if let Err(e) = self.inner.backend.logout(&token).await {
                warn!(error = %e, "backend logout failed");
            }
        }
    }

    // -- User data --------------------------------------------------------

    /// Merges `patch` into the current user and re-caches it.
    ///
    /// # Errors
    /// [`SessionError::NotAuthenticated`] if there is no user to update.
    pub fn update_user(&self, patch: UserPatch) -> Result<UserProfile, SessionError> {
        if self.inner.store.read(|s| s.user().is_none()) {
            return Err(SessionError::NotAuthenticated);
        }
        let state = self.inner.store.dispatch(Action::UpdateUser(patch));
        let user = state.user().cloned().ok_or(SessionError::NotAuthenticated)?;
        if let Err(e) = self.inner.vault.save_user(&user) {
            warn!(error = %e, "failed to cache updated user");
        }
        Ok(user)
    }

    /// Re-fetches the user from the backend and replaces the snapshot in
    /// state and cache.
    ///
    /// # Errors
    /// Whatever [`with_auth_retry`](Self::with_auth_retry) returns, or
    /// [`SessionError::Superseded`] if the session was logged out or
    /// replaced while the request was out.
    pub async fn refresh_user_data(&self) -> Result<UserProfile, SessionError> {
        let epoch = self.inner.refresh.current_epoch();
        let backend = self.inner.backend.as_ref();
        let user = self
            .with_auth_retry(|token| async move {
                backend.fetch_current_user(&token).await
            })
            .await?;

        if self.inner.refresh.current_epoch() != epoch {
            debug!("session changed while fetching the user, discarding result");
            return Err(SessionError::Superseded);
        }

        let tokens = self
            .inner
            .store
            .read(SessionState::tokens)
            .ok_or(SessionError::NotAuthenticated)?;
        if let Err(e) = self.inner.vault.save_user(&user) {
            warn!(error = %e, "failed to cache user snapshot");
        }
        self.inner.store.dispatch(Action::LoginSuccess {
            user: user.clone(),
            tokens,
        });
        Ok(user)
    }

    // -- Tokens -----------------------------------------------------------

    /// Exchanges the refresh token for new credentials. Concurrent calls
    /// share one exchange; see [`RefreshCoordinator::refresh`].
    pub async fn refresh_access_token(&self) -> Result<TokenPair, SessionError> {
        self.inner.refresh.refresh().await
    }

    /// Runs an authorized backend request, refreshing once on 401/403.
    ///
    /// `request` gets the access token to use. If it fails with an
    /// authorization error, the access token is refreshed (joining any
    /// refresh already running) and `request` runs one more time with
    /// the new token. Its second answer is final.
    ///
    /// # Errors
    /// - [`SessionError::NotAuthenticated`]: no access token at all
    /// - refresh errors, if the retry needed one and it failed
    /// - [`SessionError::Backend`]: the request's own failure
    pub async fn with_auth_retry<T, F, Fut>(&self, mut request: F) -> Result<T, SessionError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let token = self.access_token().ok_or(SessionError::NotAuthenticated)?;
        match request(token).await {
            Err(err) if err.is_authorization() => {
                debug!(error = %err, "request unauthorized, refreshing and retrying once");
                let tokens = self.refresh_access_token().await?;
                Ok(request(tokens.access_token).await?)
            }
            other => Ok(other?),
        }
    }

    fn commit_login(&self, user: UserProfile, tokens: TokenPair) {
        if let Err(e) = self
            .inner
            .vault
            .save(&PersistedCredentials::authenticated(&tokens, &user))
        {
            warn!(error = %e, "failed to persist credentials");
        }
        info!(user_id = %user.id, "logged in");
        self.inner.store.dispatch(Action::LoginSuccess { user, tokens });
    }
}

impl<B, S> fmt::Debug for AuthSession<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("store", &self.inner.store)
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}
