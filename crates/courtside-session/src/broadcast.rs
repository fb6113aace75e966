//! Publish/subscribe channel for token lifecycle events.
//!
//! Some parts of the client don't watch the session store at all (an
//! upload widget holding its own copy of the access token, a socket that
//! must reconnect with the new one). They subscribe here instead.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use courtside_protocol::UserProfile;
use tracing::debug;

use crate::SubscriptionId;
use crate::store::IdSource;

/// Something happened to the session's credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A refresh succeeded; these are the credentials now in use.
    TokenRefreshed {
        access_token: String,
        refresh_token: Option<String>,
        user: UserProfile,
    },

    /// A refresh failed and the session was logged out.
    TokenRefreshFailed,
}

impl AuthEvent {
    /// The event's wire name, as other in-page components know it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenRefreshed { .. } => "tokenRefreshed",
            Self::TokenRefreshFailed => "tokenRefreshFailed",
        }
    }
}

type EventListener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct BroadcasterInner {
    listeners: Vec<(SubscriptionId, EventListener)>,
    closed: bool,
}

/// An explicit observer list for [`AuthEvent`]s.
///
/// Delivery is synchronous and best effort: `publish` calls every
/// listener registered at the moment it starts, in registration order. A
/// listener added while a publish is running misses that publish.
///
/// Lives as long as the session; [`close`](Self::close) is the unload
/// hook, after which everything is a no-op.
#[derive(Default)]
pub struct Broadcaster {
    inner: Mutex<BroadcasterInner>,
    ids: IdSource,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. After `close`, the listener is dropped
    /// immediately and never called.
    pub fn subscribe(
        &self,
        listener: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.ids.next();
        let mut inner = self.lock();
        if !inner.closed {
            inner.listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    /// Delivers `event` to the current listeners and returns how many
    /// were called.
    pub fn publish(&self, event: &AuthEvent) -> usize {
        let listeners: Vec<EventListener> = {
            let inner = self.lock();
            if inner.closed {
                debug!(event = event.kind(), "broadcaster closed, event dropped");
                return 0;
            }
            inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        debug!(event = event.kind(), listeners = listeners.len(), "publishing auth event");
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Drops every listener and ignores all later publishes.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, BroadcasterInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Broadcaster")
            .field("listeners", &inner.listeners.len())
            .field("closed", &inner.closed)
            .finish()
    }
}
