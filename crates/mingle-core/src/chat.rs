//! Chat connection manager.
//!
//! [`ChatConnection`] composes the lifecycle controller, the inbound router
//! and the writing debouncer around a single transport binding, and exposes
//! the room operations the application uses.
//!
//! One instance is created by the application's composition root and handed
//! to whoever needs it; there is no global instance. The "one connection"
//! invariant follows from ownership: the manager holds at most one transport,
//! and the controller allows at most one attempt in flight.
//!
//! # Driving
//!
//! ```text
//! app ──connect/join/send/...──> ChatConnection ──emit/reconnect/close──> Transport
//!                                   ^      ^
//!            handle_event(ev) ──────┘      └────── tick(now) at next_deadline()
//! ```

use std::time::Instant;

use chrono::{DateTime, Utc};
use mingle_proto::OutboundEvent;
use tracing::{debug, warn};

use crate::{
    config::ChatConfig,
    connection::{ConnectAction, ConnectCallback, ConnectController, ConnectionState},
    room::{AuthToken, Room, iso_timestamp},
    router::{EventRouter, ListenerSet},
    transport::{Connector, Transport, TransportEvent, TransportOptions},
    writing::{WritingDebouncer, WritingSignal},
};

/// A transport together with the listeners bound when it was created.
struct Binding<T> {
    transport: T,
    router: EventRouter,
}

/// Realtime chat connection manager.
pub struct ChatConnection<C: Connector> {
    config: ChatConfig,
    connector: C,
    binding: Option<Binding<C::Transport>>,
    token: Option<AuthToken>,
    controller: ConnectController,
    writing: WritingDebouncer,
}

impl<C: Connector> ChatConnection<C> {
    /// Disconnected manager that will open transports through `connector`.
    pub fn new(config: ChatConfig, connector: C) -> Self {
        let controller = ConnectController::new(config.connect_timeout);
        let writing = WritingDebouncer::new(config.writing_idle);
        Self { config, connector, binding: None, token: None, controller, writing }
    }

    /// Active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Connector used to open transports.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    /// Whether the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.controller.is_connected()
    }

    /// Whether an attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.controller.is_connecting()
    }

    /// Whether a transport has been created and not discarded.
    pub fn has_transport(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether "writing" is currently announced.
    pub fn is_writing_announced(&self) -> bool {
        self.writing.is_announced()
    }

    /// Connect with the configured retry budget.
    ///
    /// `callback` receives the outcome exactly once. `listeners` are bound
    /// only if this call creates the transport.
    pub fn connect<F>(&mut self, now: Instant, token: &AuthToken, listeners: ListenerSet, callback: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let retries = self.config.max_retries;
        self.connect_with_retries(now, token, listeners, Some(Box::new(callback)), retries);
    }

    /// Connect with an explicit retry budget and optional callback.
    pub fn connect_with_retries(
        &mut self,
        now: Instant,
        token: &AuthToken,
        listeners: ListenerSet,
        callback: Option<ConnectCallback>,
        retries: u32,
    ) {
        if let Some(action) = self.controller.connect(now, callback, retries) {
            self.token = Some(token.clone());
            self.apply(action, Some(listeners));
        }
    }

    /// Disconnect, or abort the attempt in flight.
    ///
    /// When connected and "writing" is announced, the stop signal is sent
    /// before the transport closes. Waiting connect callbacks receive `false`
    /// before this returns.
    pub fn disconnect(&mut self) {
        let owed_stop = self.writing.reset();
        if self.controller.is_connected()
            && let Some(signal) = owed_stop
        {
            self.emit_writing(signal);
        }

        if let Some(action) = self.controller.disconnect() {
            debug!("disconnecting chat");
            self.apply(action, None);
        }
    }

    /// Disconnect and drop the transport so the next `connect()` creates a
    /// fresh one with fresh listeners.
    pub fn discard_transport(&mut self) {
        self.disconnect();
        if self.binding.take().is_some() {
            debug!("discarded chat transport");
        }
    }

    /// Feed a signal reported by the transport.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.controller.on_connected();
            },
            TransportEvent::Closed { reason } | TransportEvent::Disconnected { reason } => {
                if self.controller.on_closed(&reason) && self.writing.reset().is_some() {
                    debug!("transport gone, dropping owed stop-writing signal");
                }
            },
            TransportEvent::Inbound(event) => match &self.binding {
                Some(binding) => binding.router.route(&event),
                None => debug!(event = %event.name(), "inbound event without transport"),
            },
        }
    }

    /// Process timers due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if let Some(signal) = self.writing.poll(now) {
            self.emit_writing(signal);
        }

        if let Some(action) = self.controller.poll_timeout(now) {
            self.apply(action, None);
        }
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.controller.next_deadline(), self.writing.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Join a room and acknowledge its last known message.
    pub fn join_room(&mut self, room: &Room) {
        debug!(room_id = %room.id, has_last_message = room.last_message.is_some(), "joinRoom");
        self.emit(OutboundEvent::join_room(room.id.as_str()));

        if let Some(last) = &room.last_message {
            self.read_message(&room.id, &last.id, &last.created_at);
        }
    }

    /// Leave a room.
    pub fn leave_room(&mut self, room_id: &str) {
        debug!(room_id, "leaveRoom");
        self.emit(OutboundEvent::leave_room(room_id));
    }

    /// Send a message with a caller-generated id.
    pub fn send_message(&mut self, room_id: &str, id: &str, text: &str) {
        debug!(room_id, message_id = id, len = text.len(), "sendMessage");
        self.emit(OutboundEvent::send_message(room_id, id, text));
    }

    /// Acknowledge a message.
    pub fn read_message(&mut self, room_id: &str, message_id: &str, created_at: &DateTime<Utc>) {
        let date = iso_timestamp(created_at);
        debug!(room_id, message_id, %date, "readMessage");
        self.emit(OutboundEvent::read_message(room_id, message_id, date));
    }

    /// Record typing activity in a room.
    pub fn set_writing(&mut self, now: Instant, room_id: &str) {
        for signal in self.writing.set_writing(now, room_id) {
            self.emit_writing(signal);
        }
    }

    fn emit_writing(&mut self, signal: WritingSignal) {
        debug!(room_id = %signal.room_id, state = signal.writing, "isWriting");
        self.emit(OutboundEvent::is_writing(signal.room_id, signal.writing));
    }

    fn emit(&mut self, event: OutboundEvent) {
        match &mut self.binding {
            Some(binding) => binding.transport.emit(&event),
            None => warn!(event = %event.name(), room_id = event.room_id(), "no transport, dropping event"),
        }
    }

    fn apply(&mut self, action: ConnectAction, listeners: Option<ListenerSet>) {
        match action {
            ConnectAction::StartAttempt { attempt, retries_remaining } => {
                let Some(token) = &self.token else {
                    warn!(attempt, "connection attempt without credentials");
                    return;
                };

                if let Some(binding) = &mut self.binding {
                    if listeners.is_some() {
                        debug!("transport already bound, keeping its listeners");
                    }
                    debug!(attempt, retries_remaining, "reconnecting chat transport");
                    binding.transport.reconnect(token);
                } else {
                    debug!(attempt, retries_remaining, "opening chat transport");
                    let options = TransportOptions::new(&self.config.endpoint, token);
                    let transport = self.connector.open(options);
                    let router = EventRouter::new(listeners.unwrap_or_default());
                    self.binding = Some(Binding { transport, router });
                }
            },
            ConnectAction::CloseTransport => {
                if let Some(binding) = &mut self.binding {
                    binding.transport.close();
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use chrono::TimeZone;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Open,
        Reconnect,
        Close,
        Emit(OutboundEvent),
    }

    #[derive(Default, Clone)]
    struct FakeConnector {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    struct FakeTransport {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl Transport for FakeTransport {
        fn reconnect(&mut self, _token: &AuthToken) {
            self.calls.lock().unwrap().push(Call::Reconnect);
        }

        fn close(&mut self) {
            self.calls.lock().unwrap().push(Call::Close);
        }

        fn emit(&mut self, event: &OutboundEvent) {
            self.calls.lock().unwrap().push(Call::Emit(event.clone()));
        }
    }

    impl Connector for FakeConnector {
        type Transport = FakeTransport;

        fn open(&mut self, _options: TransportOptions) -> FakeTransport {
            self.calls.lock().unwrap().push(Call::Open);
            FakeTransport { calls: self.calls.clone() }
        }
    }

    fn connected() -> (ChatConnection<FakeConnector>, Arc<Mutex<Vec<Call>>>, Instant) {
        let t0 = Instant::now();
        let connector = FakeConnector::default();
        let calls = connector.calls.clone();
        let mut chat = ChatConnection::new(ChatConfig::default(), connector);
        chat.connect(t0, &AuthToken::new("t", 60), ListenerSet::new(), |_| {});
        chat.handle_event(TransportEvent::Connected);
        calls.lock().unwrap().clear();
        (chat, calls, t0)
    }

    #[test]
    fn join_room_acknowledges_last_message() {
        let (mut chat, calls, _) = connected();
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        chat.join_room(&Room::new("r1").with_last_message("m7", created));
        chat.join_room(&Room::new("r2"));

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Emit(OutboundEvent::join_room("r1")),
                Call::Emit(OutboundEvent::read_message("r1", "m7", "2024-05-01T10:00:00.000Z")),
                Call::Emit(OutboundEvent::join_room("r2")),
            ]
        );
    }

    #[test]
    fn disconnect_sends_owed_stop_before_close() {
        let (mut chat, calls, t0) = connected();
        chat.set_writing(t0, "r1");
        chat.disconnect();
        chat.tick(t0 + Duration::from_secs(5));

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Emit(OutboundEvent::is_writing("r1", true)),
                Call::Emit(OutboundEvent::is_writing("r1", false)),
                Call::Close,
            ]
        );
        assert!(!chat.is_connected());
    }

    #[test]
    fn reconnect_reuses_transport() {
        let (mut chat, calls, t0) = connected();
        chat.disconnect();
        chat.connect(t0, &AuthToken::new("t2", 60), ListenerSet::new(), |_| {});

        assert_eq!(*calls.lock().unwrap(), vec![Call::Close, Call::Reconnect]);
    }

    #[test]
    fn discard_transport_forces_fresh_open() {
        let (mut chat, calls, t0) = connected();
        chat.discard_transport();
        assert!(!chat.has_transport());

        chat.connect(t0, &AuthToken::new("t", 60), ListenerSet::new(), |_| {});
        assert_eq!(*calls.lock().unwrap(), vec![Call::Close, Call::Open]);
    }

    #[test]
    fn emits_without_transport_are_dropped() {
        let connector = FakeConnector::default();
        let calls = connector.calls.clone();
        let mut chat = ChatConnection::new(ChatConfig::default(), connector);

        chat.send_message("r1", "m1", "hi");
        assert!(calls.lock().unwrap().is_empty());
    }
}
