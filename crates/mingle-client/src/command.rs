//! Commands sent from [`crate::ChatClient`] handles to the runtime.

use chrono::{DateTime, Utc};
use mingle_core::{AuthToken, ConnectionState, ListenerSet, Room, RoomId};
use tokio::sync::oneshot;

#[derive(Debug)]
pub(crate) enum Command {
    Connect { token: AuthToken, listeners: ListenerSet, reply: oneshot::Sender<bool> },
    Disconnect { reply: oneshot::Sender<()> },
    DiscardTransport,
    JoinRoom(Room),
    LeaveRoom(RoomId),
    SendMessage { room_id: RoomId, id: String, text: String },
    ReadMessage { room_id: RoomId, message_id: String, created_at: DateTime<Utc> },
    SetWriting(RoomId),
    State(oneshot::Sender<ConnectionState>),
}
