//! Inbound event routing.
//!
//! An [`EventRouter`] is created together with a transport and lives exactly
//! as long as it does, so listeners are bound once per transport instance.
//! Reconnecting the same transport reuses the router; listeners supplied on
//! a later `connect()` are ignored until a fresh transport is created.
//!
//! # Example
//!
//! ```
//! use mingle_core::ListenerSet;
//!
//! let listeners = ListenerSet::new()
//!     .on_message_received(|message| {
//!         tracing::info!(%message, "new message");
//!     });
//! ```

use std::{fmt, sync::Arc};

use mingle_proto::InboundEvent;
use serde_json::Value;
use tracing::debug;

/// Listener callback. Receives the opaque payload of an inbound event.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

fn noop() -> Listener {
    Arc::new(|_| {})
}

/// Callbacks for server-pushed events. Unset listeners are no-ops.
#[derive(Clone)]
pub struct ListenerSet {
    on_message_received: Listener,
    on_writing_state_change: Listener,
    on_message_read: Listener,
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self { on_message_received: noop(), on_writing_state_change: noop(), on_message_read: noop() }
    }
}

impl ListenerSet {
    /// All listeners set to no-ops.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for `receiveMessage`.
    #[must_use]
    pub fn on_message_received<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_message_received = Arc::new(f);
        self
    }

    /// Called for inbound `isWriting`.
    #[must_use]
    pub fn on_writing_state_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_writing_state_change = Arc::new(f);
        self
    }

    /// Called for inbound `readMessage`.
    #[must_use]
    pub fn on_message_read<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_message_read = Arc::new(f);
        self
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").finish_non_exhaustive()
    }
}

/// Dispatches inbound events to one bound [`ListenerSet`].
#[derive(Debug, Clone)]
pub struct EventRouter {
    listeners: ListenerSet,
}

impl EventRouter {
    /// Bind `listeners`.
    pub fn new(listeners: ListenerSet) -> Self {
        Self { listeners }
    }

    /// Forward `event` to its listener.
    pub fn route(&self, event: &InboundEvent) {
        debug!(event = %event.name(), "routing inbound event");

        let listener = match event {
            InboundEvent::MessageReceived(_) => &self.listeners.on_message_received,
            InboundEvent::MessageRead(_) => &self.listeners.on_message_read,
            InboundEvent::WritingChanged(_) => &self.listeners.on_writing_state_change,
        };
        listener(event.payload());
    }
}
