//! Session state and the reducer that changes it.
//!
//! The state only ever changes through an [`Action`]. Every action is
//! applied by [`SessionState::reduce`], a total function: it never fails
//! and never panics, whatever the current state is.

use courtside_protocol::{TokenPair, UserPatch, UserProfile};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// What the client currently believes about the logged-in user.
///
/// ```text
///              LoginStart
///   [loading] ───────────→ [loading]
///       │                      │
///       │ SetLoading(false)    ├─ LoginSuccess ──→ [authenticated]
///       ▼                      └─ LoginFailure ──→ [anonymous + error]
///   [anonymous]                                         ▲
///       ▲                                               │
///       └──────────── Logout ◄──── [authenticated] ─────┘
/// ```
///
/// Two invariants hold in every reachable state:
/// - authenticated ⇔ an access token is present
/// - not authenticated ⇒ no user and no tokens at all
///
/// Fields are private so nothing outside this module can break them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    is_authenticated: bool,
    user: Option<UserProfile>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    loading: bool,
    error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

impl SessionState {
    /// The state at application start: nothing known yet, bootstrap
    /// pending, so `loading` is `true`.
    pub fn initial() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            access_token: None,
            refresh_token: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// `true` while bootstrap or an explicit sign-in is in progress.
    /// Protected screens should show a waiting state, not content and
    /// not a login prompt.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Both credentials, if the session is authenticated.
    pub fn tokens(&self) -> Option<TokenPair> {
        self.access_token
            .as_ref()
            .map(|access| TokenPair::new(access.clone(), self.refresh_token.clone()))
    }

    /// Applies one action and returns the resulting state.
    pub fn reduce(self, action: &Action) -> Self {
        match action {
            Action::LoginStart => Self {
                loading: true,
                error: None,
                ..self
            },
            Action::LoginSuccess { user, tokens } => Self {
                is_authenticated: true,
                user: Some(user.clone()),
                access_token: Some(tokens.access_token.clone()),
                refresh_token: tokens.refresh_token.clone(),
                loading: false,
                error: None,
            },
            Action::LoginFailure(message) => Self {
                error: Some(message.clone()),
                ..Self::logged_out()
            },
            Action::Logout => Self::logged_out(),
            Action::UpdateUser(patch) => match self.user {
                Some(mut user) => {
                    user.apply(patch);
                    Self {
                        user: Some(user),
                        ..self
                    }
                }
                // Nothing to merge into.
                None => self,
            },
            Action::SetLoading(loading) => Self {
                loading: *loading,
                ..self
            },
        }
    }

    fn logged_out() -> Self {
        Self {
            loading: false,
            ..Self::initial()
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// A named transition of [`SessionState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A sign-in began: `loading`, error cleared, nothing else touched.
    LoginStart,

    /// Credentials were accepted (login, bootstrap or refresh).
    LoginSuccess { user: UserProfile, tokens: TokenPair },

    /// Credentials were rejected. Clears everything and records why.
    LoginFailure(String),

    /// The session ended. Clears everything, no error.
    Logout,

    /// Merge a partial profile into the current user. No-op without one.
    UpdateUser(UserPatch),

    /// Sets `loading` only.
    SetLoading(bool),
}

impl Action {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginStart => "LOGIN_START",
            Self::LoginSuccess { .. } => "LOGIN_SUCCESS",
            Self::LoginFailure(_) => "LOGIN_FAILURE",
            Self::Logout => "LOGOUT",
            Self::UpdateUser(_) => "UPDATE_USER",
            Self::SetLoading(_) => "SET_LOADING",
        }
    }
}
