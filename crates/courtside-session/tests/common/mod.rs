//! Shared fixtures for the session integration tests.
//!
//! [`MockBackend`] answers from per-endpoint scripts. An unscripted call
//! fails with a network error, so a test that forgets to script
//! something sees an outage rather than a silent success.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use courtside_protocol::{AuthResponse, LoginRequest, TokenPair, UserProfile};
use courtside_session::AuthSession;
use courtside_storage::{CredentialVault, MemoryStore, PersistedCredentials};
use courtside_transport::{AuthBackend, BackendError};
use tokio::sync::Semaphore;

type Script<T> = Mutex<VecDeque<Result<T, BackendError>>>;

#[derive(Default)]
pub struct MockBackend {
    login: Script<AuthResponse>,
    current_user: Script<UserProfile>,
    refresh: Script<AuthResponse>,
    logout: Script<()>,

    /// When set, `refresh` waits for a permit before answering.
    refresh_gate: Option<Arc<Semaphore>>,
    /// When set, `fetch_current_user` waits for a permit before answering.
    current_user_gate: Option<Arc<Semaphore>>,

    pub login_calls: AtomicUsize,
    pub current_user_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,

    /// Access tokens presented to `fetch_current_user`, in order.
    pub presented_tokens: Mutex<Vec<String>>,
    /// Refresh tokens presented to `refresh`, in order.
    pub spent_refresh_tokens: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose refreshes block until the returned semaphore
    /// gets a permit.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            refresh_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (backend, gate)
    }

    /// A backend whose `fetch_current_user` calls block until the
    /// returned semaphore gets a permit.
    pub fn gated_current_user() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Self {
            current_user_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn on_login(self, result: Result<AuthResponse, BackendError>) -> Self {
        self.login.lock().unwrap().push_back(result);
        self
    }

    pub fn on_current_user(self, result: Result<UserProfile, BackendError>) -> Self {
        self.current_user.lock().unwrap().push_back(result);
        self
    }

    pub fn on_refresh(self, result: Result<AuthResponse, BackendError>) -> Self {
        self.refresh.lock().unwrap().push_back(result);
        self
    }

    pub fn on_logout(self, result: Result<(), BackendError>) -> Self {
        self.logout.lock().unwrap().push_back(result);
        self
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn current_user_count(&self) -> usize {
        self.current_user_calls.load(Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn login_count(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn presented(&self) -> Vec<String> {
        self.presented_tokens.lock().unwrap().clone()
    }

    pub fn spent(&self) -> Vec<String> {
        self.spent_refresh_tokens.lock().unwrap().clone()
    }
}

fn next<T>(script: &Script<T>) -> Result<T, BackendError> {
    script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(BackendError::Network("unscripted call".into())))
}

impl AuthBackend for MockBackend {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthResponse, BackendError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        next(&self.login)
    }

    async fn fetch_current_user(&self, access_token: &str) -> Result<UserProfile, BackendError> {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        self.presented_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        if let Some(gate) = &self.current_user_gate {
            gate.acquire().await.unwrap().forget();
        } else {
            tokio::task::yield_now().await;
        }
        next(&self.current_user)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, BackendError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.spent_refresh_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(gate) = &self.refresh_gate {
            gate.acquire().await.unwrap().forget();
        } else {
            tokio::task::yield_now().await;
        }
        next(&self.refresh)
    }

    async fn logout(&self, _access_token: &str) -> Result<(), BackendError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        // Logout is best effort; unscripted means it worked.
        self.logout.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

// =========================================================================
// Builders
// =========================================================================

pub type TestSession = AuthSession<MockBackend, MemoryStore>;

pub fn user(id: &str) -> UserProfile {
    UserProfile::new(id, format!("{id}@example.com"))
}

pub fn tokens(access: &str, refresh: Option<&str>) -> TokenPair {
    TokenPair::new(access, refresh.map(str::to_string))
}

pub fn auth_response(access: &str, refresh: Option<&str>, user: UserProfile) -> AuthResponse {
    AuthResponse {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        user,
    }
}

pub fn unauthorized() -> BackendError {
    BackendError::from_status(401, "jwt expired")
}

pub fn outage() -> BackendError {
    BackendError::Network("connection refused".into())
}

/// A store pre-populated as if a previous run had logged in.
pub fn seeded_store(
    access: Option<&str>,
    refresh: Option<&str>,
    cached_user: Option<UserProfile>,
) -> MemoryStore {
    let store = MemoryStore::new();
    CredentialVault::new(store.clone())
        .save(&PersistedCredentials {
            access_token: access.map(str::to_string),
            refresh_token: refresh.map(str::to_string),
            cached_user,
        })
        .unwrap();
    store
}

/// A session already logged in as `user("u1")` with `access-1`/`refresh-1`.
pub fn logged_in(backend: MockBackend) -> TestSession {
    let session = AuthSession::new(backend, MemoryStore::new());
    session
        .login(user("u1"), Some(tokens("access-1", Some("refresh-1"))))
        .unwrap();
    session
}

/// Records every event kind published on the session's broadcaster.
pub fn record_events(session: &TestSession) -> Arc<Mutex<Vec<&'static str>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session
        .events()
        .subscribe(move |event| sink.lock().unwrap().push(event.kind()));
    seen
}
