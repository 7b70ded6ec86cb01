//! Application-facing handle.

use chrono::{DateTime, Utc};
use mingle_core::{AuthToken, ConnectionState, ListenerSet, Room};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::command::Command;

/// Cloneable handle to a running [`crate::Runtime`].
///
/// Every method is a message to the runtime task; calls from any number of
/// clones are applied in the order the runtime receives them. Once the runtime
/// has stopped, operations are dropped with a warning and `connect` reports
/// `false`.
#[derive(Debug, Clone)]
pub struct ChatClient {
    commands: mpsc::UnboundedSender<Command>,
}

impl ChatClient {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { commands }
    }

    /// Connect with `token`, binding `listeners` if a transport is created.
    ///
    /// Resolves `true` once the connection is established (immediately if it
    /// already is), `false` if every attempt fails, the transport closes, or
    /// `disconnect` is called first. Never errors.
    pub async fn connect(&self, token: AuthToken, listeners: ListenerSet) -> bool {
        let (reply, outcome) = oneshot::channel();
        if !self.send(Command::Connect { token, listeners, reply }) {
            return false;
        }
        outcome.await.unwrap_or(false)
    }

    /// Disconnect; returns after the runtime has applied it.
    pub async fn disconnect(&self) {
        let (reply, done) = oneshot::channel();
        if self.send(Command::Disconnect { reply }) {
            let _ = done.await;
        }
    }

    /// Forget the current transport so the next connect creates a fresh one.
    pub fn discard_transport(&self) {
        self.send(Command::DiscardTransport);
    }

    /// Join `room`, acknowledging its last message if known.
    pub fn join_room(&self, room: Room) {
        self.send(Command::JoinRoom(room));
    }

    /// Leave the room with `room_id`.
    pub fn leave_room(&self, room_id: impl Into<String>) {
        self.send(Command::LeaveRoom(room_id.into()));
    }

    /// Send a message with a client-generated `id`.
    pub fn send_message(
        &self,
        room_id: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.send(Command::SendMessage { room_id: room_id.into(), id: id.into(), text: text.into() });
    }

    /// Mark a message as read.
    pub fn read_message(
        &self,
        room_id: impl Into<String>,
        message_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) {
        self.send(Command::ReadMessage {
            room_id: room_id.into(),
            message_id: message_id.into(),
            created_at,
        });
    }

    /// Report typing activity in `room_id`.
    pub fn set_writing(&self, room_id: impl Into<String>) {
        self.send(Command::SetWriting(room_id.into()));
    }

    /// Current connection state; `Disconnected` if the runtime has stopped.
    pub async fn state(&self) -> ConnectionState {
        let (reply, state) = oneshot::channel();
        if !self.send(Command::State(reply)) {
            return ConnectionState::Disconnected;
        }
        state.await.unwrap_or(ConnectionState::Disconnected)
    }

    /// Whether the connection is established.
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    fn send(&self, command: Command) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(rejected) => {
                warn!(command = ?rejected.0, "chat runtime stopped, dropping command");
                false
            },
        }
    }
}
