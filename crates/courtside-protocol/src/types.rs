//! Data types exchanged with the booking backend and kept in the cache.
//!
//! Everything here is plain data: no I/O, no session rules. The JSON
//! shape follows the backend, which uses camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// What a user is allowed to manage on the platform.
///
/// Players book courts, owners run facilities, admins run everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Owner,
    Admin,
}

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// A snapshot of the logged-in user as the backend last described it.
///
/// This is a denormalized copy, not a live link: it goes stale the moment
/// the user edits their profile somewhere else, which is why
/// `refresh_user_data` exists on the session.
///
/// Fields the client doesn't model (booking stats, preferences, whatever
/// the backend adds next) are kept in `extra` so that writing the profile
/// back to the cache doesn't silently drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend identifier. Some endpoints still send `_id`.
    #[serde(alias = "_id")]
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Unmodelled fields, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Creates a profile with the given identity and no optional data.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: String::new(),
            role: UserRole::default(),
            phone: None,
            avatar_url: None,
            extra: Map::new(),
        }
    }

    /// Overwrites every field the patch carries and leaves the rest alone.
    ///
    /// The `id` is never patched: a profile update can't turn one user
    /// into another.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = Some(avatar_url.clone());
        }
        for (key, value) in &patch.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A partial update to a [`UserProfile`].
///
/// `None` means "leave as is". Built by profile screens after a successful
/// save, so the session can reflect the change without a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    /// Returns `true` if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.role.is_none()
            && self.phone.is_none()
            && self.avatar_url.is_none()
            && self.extra.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// The two rotating credentials.
///
/// Both are opaque strings; the client never looks inside them. The
/// refresh token is optional because some login flows (and some refresh
/// responses) only hand out an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Body returned by both `POST /auth/login` and `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

impl AuthResponse {
    /// Splits the response into the credentials it carries.
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(self.access_token.clone(), self.refresh_token.clone())
    }
}

/// Body returned by `GET /users/me`.
///
/// Older backend builds return the profile bare, newer ones wrap it in
/// `{ "user": ... }`. `#[serde(untagged)]` tries each variant in order,
/// so the wrapped form wins whenever a `user` key is present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CurrentUserResponse {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl CurrentUserResponse {
    pub fn into_user(self) -> UserProfile {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}
