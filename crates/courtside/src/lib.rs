//! # Courtside
//!
//! Authentication session client for the Courtside sports-facility
//! booking platform.
//!
//! Courtside keeps one answer to "who is logged in" for the whole client:
//! it restores the session from a local cache at startup, checks it with
//! the backend, refreshes expired access tokens exactly once no matter how
//! many requests notice, and tells the UI about every change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courtside::prelude::*;
//!
//! # async fn run() -> Result<(), CourtsideError> {
//! let client = CourtsideClientBuilder::new()
//!     .config(ClientConfig::from_env()?)
//!     .build()?;
//!
//! client.subscribe(|state| {
//!     if !state.is_loading() {
//!         println!("authenticated: {}", state.is_authenticated());
//!     }
//! });
//!
//! match client.bootstrap().await? {
//!     outcome if outcome.is_authenticated() => {}
//!     _ => {
//!         client.sign_in("ana@example.com", "secret").await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;

pub use client::{ClientStore, CourtsideClient, CourtsideClientBuilder};
pub use config::ClientConfig;
pub use error::CourtsideError;

pub use courtside_protocol as protocol;
pub use courtside_session as session;
pub use courtside_storage as storage;
pub use courtside_transport as transport;

/// Everything an application usually needs, in one import.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientStore, CourtsideClient, CourtsideClientBuilder, CourtsideError,
    };
    pub use courtside_protocol::{TokenPair, UserPatch, UserProfile, UserRole};
    pub use courtside_session::{
        AuthEvent, AuthSession, BootstrapOutcome, SessionError, SessionState,
        SubscriptionId,
    };
    pub use courtside_storage::{FileStore, KeyValueStore, MemoryStore};
    pub use courtside_transport::{AuthBackend, BackendConfig, BackendError, HttpBackend};
}
