//! Authentication session lifecycle for the Courtside booking client.
//!
//! This crate owns the client's belief about who is logged in:
//!
//! 1. **State**: [`SessionState`], changed only through [`Action`]s by a
//!    pure reducer.
//! 2. **Store**: [`SessionStore`], the single copy of that state, with
//!    ordered change notifications.
//! 3. **Refresh**: [`RefreshCoordinator`], which turns any number of
//!    concurrent "my token expired" calls into one backend exchange.
//! 4. **Bootstrap**: the once-per-start reconciliation of cached
//!    credentials against the backend ([`BootstrapOutcome`]).
//! 5. **Events**: [`Broadcaster`], telling independent listeners that
//!    tokens were rotated or the session was lost.
//!
//! [`AuthSession`] ties them together and is the only type most code needs.
//!
//! # How it fits in the stack
//!
//! ```text
//! UI / CRUD API calls (above)  ← read state, call refresh on 401
//!     ↕
//! Session Layer (this crate)   ← owns state, tokens and their lifecycle
//!     ↕                  ↕
//! Transport (backend)   Storage (credential cache)
//! ```

mod bootstrap;
mod broadcast;
mod error;
mod refresh;
mod service;
mod state;
mod store;

pub use bootstrap::BootstrapOutcome;
pub use broadcast::{AuthEvent, Broadcaster};
pub use error::SessionError;
pub use refresh::RefreshCoordinator;
pub use service::AuthSession;
pub use state::{Action, SessionState};
pub use store::{SessionStore, SubscriptionId};
