//! The session store: one copy of [`SessionState`] and its subscribers.
//!
//! # Notification order
//!
//! Every dispatch produces exactly one notification, and notifications
//! are delivered in dispatch order. Nothing is coalesced: five quick
//! dispatches mean five callbacks, each with the state right after its
//! own action.
//!
//! Listeners may dispatch from inside their callback. The nested state
//! is queued and delivered once the current one has reached every
//! listener, so order is preserved and nothing deadlocks: whichever call
//! finds the queue idle drains it, the others only enqueue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{Action, SessionState};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Hands out increasing subscription ids.
#[derive(Debug, Default)]
pub(crate) struct IdSource(AtomicU64);

impl IdSource {
    pub(crate) fn next(&self) -> SubscriptionId {
        SubscriptionId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

type StateListener = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct StoreInner {
    state: SessionState,
    listeners: Vec<(SubscriptionId, StateListener)>,
    /// States produced but not yet delivered, oldest first.
    pending: VecDeque<SessionState>,
    /// Someone is currently delivering `pending`.
    draining: bool,
}

/// The single source of truth for session state.
///
/// The lock is never held while a listener runs, so listeners can read
/// the store, subscribe, unsubscribe or dispatch.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
    ids: IdSource,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store in [`SessionState::initial`].
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                state: SessionState::initial(),
                listeners: Vec::new(),
                pending: VecDeque::new(),
                draining: false,
            }),
            ids: IdSource::default(),
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Reads the current state without cloning all of it.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock().state)
    }

    /// Applies `action`, notifies every listener, and returns the state
    /// the action produced.
    pub fn dispatch(&self, action: Action) -> SessionState {
        let next = {
            let mut inner = self.lock();
            let next = std::mem::take(&mut inner.state).reduce(&action);
            inner.state = next.clone();
            inner.pending.push_back(next.clone());
            next
        };
        debug!(
            action = action.name(),
            authenticated = next.is_authenticated(),
            loading = next.is_loading(),
            "session transition"
        );
        self.drain();
        next
    }

    /// Registers a listener called after every dispatch with the new
    /// state.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.ids.next();
        self.lock().listeners.push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Delivers queued states until the queue is empty, unless another
    /// call is already doing so.
    fn drain(&self) {
        {
            let mut inner = self.lock();
            if inner.draining {
                return;
            }
            inner.draining = true;
        }
        let _guard = DrainGuard(self);

        loop {
            let (state, listeners) = {
                let mut inner = self.lock();
                let Some(state) = inner.pending.pop_front() else {
                    // Cleared under the same lock that saw the queue empty,
                    // so a concurrent dispatch either got drained here or
                    // will drain itself.
                    inner.draining = false;
                    return;
                };
                (state, inner.listeners.clone())
            };
            for (_, listener) in &listeners {
                listener(&state);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panicking listener never runs under this lock, so the data
        // behind a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the draining flag if a listener panics, so later dispatches
/// still get delivered.
struct DrainGuard<'a>(&'a SessionStore);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionStore")
            .field("state", &inner.state)
            .field("subscribers", &inner.listeners.len())
            .finish()
    }
}
