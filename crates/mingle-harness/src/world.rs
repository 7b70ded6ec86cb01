//! Scenario world.
//!
//! Bundles a virtual clock, a [`ChatConnection`] over a recording transport
//! and the transport log, and plays the server side through explicit calls.
//! Advancing time processes every timer deadline in order, exactly at its
//! deadline, the way a driver sleeping on `next_deadline()` would.

use std::time::Duration;

use mingle_core::{
    AuthToken, ChatConfig, ChatConnection, ConnectCallback, Environment, ListenerSet,
    TransportEvent,
};
use mingle_proto::InboundEvent;

use crate::{
    sim_env::SimEnv,
    sim_transport::{RecordingConnector, TransportLog},
};

/// A chat connection under test.
pub struct World {
    env: SimEnv,
    chat: ChatConnection<RecordingConnector>,
    log: TransportLog,
    token: AuthToken,
}

impl World {
    /// World with `config` and a test token.
    pub fn new(config: ChatConfig) -> Self {
        let connector = RecordingConnector::new();
        let log = connector.log();
        Self {
            env: SimEnv::new(),
            chat: ChatConnection::new(config, connector),
            log,
            token: AuthToken::new("test-token", 3600),
        }
    }

    /// World with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ChatConfig::default())
    }

    /// Clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Connection manager.
    pub fn chat(&self) -> &ChatConnection<RecordingConnector> {
        &self.chat
    }

    /// Mutable connection manager.
    pub fn chat_mut(&mut self) -> &mut ChatConnection<RecordingConnector> {
        &mut self.chat
    }

    /// Transport call log.
    pub fn log(&self) -> &TransportLog {
        &self.log
    }

    /// Virtual time since the world was created.
    pub fn elapsed(&self) -> Duration {
        self.env.elapsed()
    }

    /// Connect with no listeners.
    pub fn connect<F>(&mut self, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        self.connect_with(ListenerSet::new(), callback);
    }

    /// Connect with `listeners`.
    pub fn connect_with<F>(&mut self, listeners: ListenerSet, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let now = self.env.now();
        self.chat.connect(now, &self.token, listeners, callback);
    }

    /// Connect with an explicit retry budget.
    pub fn connect_with_retries(&mut self, callback: Option<ConnectCallback>, retries: u32) {
        let now = self.env.now();
        self.chat.connect_with_retries(now, &self.token, ListenerSet::new(), callback, retries);
    }

    /// Server accepts the pending attempt.
    pub fn server_accepts(&mut self) {
        self.chat.handle_event(TransportEvent::Connected);
    }

    /// Server refuses or closes before connecting.
    pub fn server_closes(&mut self, reason: &str) {
        self.chat.handle_event(TransportEvent::Closed { reason: reason.to_string() });
    }

    /// Established connection drops.
    pub fn server_drops(&mut self, reason: &str) {
        self.chat.handle_event(TransportEvent::Disconnected { reason: reason.to_string() });
    }

    /// Server pushes a domain event.
    pub fn server_pushes(&mut self, event: InboundEvent) {
        self.chat.handle_event(TransportEvent::Inbound(event));
    }

    /// Typing activity in `room_id` at the current virtual time.
    pub fn set_writing(&mut self, room_id: &str) {
        let now = self.env.now();
        self.chat.set_writing(now, room_id);
    }

    /// Advance the clock by `by`, processing every deadline on the way.
    pub fn advance(&mut self, by: Duration) {
        let target = self.env.now() + by;
        while let Some(deadline) = self.chat.next_deadline() {
            if deadline > target {
                break;
            }
            self.env.advance_to(deadline);
            self.chat.tick(deadline);
        }
        self.env.advance_to(target);
    }
}
