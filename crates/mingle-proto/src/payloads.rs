//! Event payloads.
//!
//! Outbound payloads are owned by this protocol and fully typed. Inbound
//! payloads belong to the server's API layer, so they are carried as opaque
//! JSON values and handed to listeners untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, events::EventName};

/// `joinRoom {roomId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    /// Room to subscribe to.
    pub room_id: String,
}

/// `leaveRoom {roomId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoom {
    /// Room to unsubscribe from.
    pub room_id: String,
}

/// `sendMessage {roomId, id, text}`
///
/// The id is generated by the caller so the UI can echo the message locally
/// before the server acknowledges it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    /// Destination room.
    pub room_id: String,
    /// Client-generated message id.
    pub id: String,
    /// Message body.
    pub text: String,
}

/// `readMessage {roomId, messageId, date}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMessage {
    /// Room containing the message.
    pub room_id: String,
    /// Message being acknowledged.
    pub message_id: String,
    /// ISO-8601 creation timestamp of the acknowledged message.
    pub date: String,
}

/// `isWriting {roomId, state}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsWriting {
    /// Room the user is typing in.
    pub room_id: String,
    /// `true` when typing started, `false` when it stopped.
    pub state: bool,
}

/// An event the client emits to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Subscribe to a room.
    JoinRoom(JoinRoom),
    /// Unsubscribe from a room.
    LeaveRoom(LeaveRoom),
    /// Post a message.
    SendMessage(SendMessage),
    /// Acknowledge a message.
    ReadMessage(ReadMessage),
    /// Typing presence.
    IsWriting(IsWriting),
}

impl OutboundEvent {
    /// Build a `joinRoom` event.
    pub fn join_room(room_id: impl Into<String>) -> Self {
        Self::JoinRoom(JoinRoom { room_id: room_id.into() })
    }

    /// Build a `leaveRoom` event.
    pub fn leave_room(room_id: impl Into<String>) -> Self {
        Self::LeaveRoom(LeaveRoom { room_id: room_id.into() })
    }

    /// Build a `sendMessage` event.
    pub fn send_message(
        room_id: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::SendMessage(SendMessage { room_id: room_id.into(), id: id.into(), text: text.into() })
    }

    /// Build a `readMessage` event.
    pub fn read_message(
        room_id: impl Into<String>,
        message_id: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self::ReadMessage(ReadMessage {
            room_id: room_id.into(),
            message_id: message_id.into(),
            date: date.into(),
        })
    }

    /// Build an `isWriting` event.
    pub fn is_writing(room_id: impl Into<String>, state: bool) -> Self {
        Self::IsWriting(IsWriting { room_id: room_id.into(), state })
    }

    /// Wire name of this event.
    pub const fn name(&self) -> EventName {
        match self {
            Self::JoinRoom(_) => EventName::JoinRoom,
            Self::LeaveRoom(_) => EventName::LeaveRoom,
            Self::SendMessage(_) => EventName::SendMessage,
            Self::ReadMessage(_) => EventName::ReadMessage,
            Self::IsWriting(_) => EventName::IsWriting,
        }
    }

    /// Room this event targets.
    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom(p) => &p.room_id,
            Self::LeaveRoom(p) => &p.room_id,
            Self::SendMessage(p) => &p.room_id,
            Self::ReadMessage(p) => &p.room_id,
            Self::IsWriting(p) => &p.room_id,
        }
    }

    /// JSON body of this event.
    pub fn payload(&self) -> Result<Value> {
        let value = match self {
            Self::JoinRoom(p) => serde_json::to_value(p)?,
            Self::LeaveRoom(p) => serde_json::to_value(p)?,
            Self::SendMessage(p) => serde_json::to_value(p)?,
            Self::ReadMessage(p) => serde_json::to_value(p)?,
            Self::IsWriting(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

/// A domain event pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// `receiveMessage`: a new message arrived in a joined room.
    MessageReceived(Value),
    /// `readMessage`: the remote party read a message.
    MessageRead(Value),
    /// `isWriting`: the remote party started or stopped typing.
    WritingChanged(Value),
}

impl InboundEvent {
    /// Classify a named event from the wire.
    ///
    /// Returns `None` for names outside the inbound set, including
    /// outbound-only names a misbehaving server might echo.
    pub fn from_wire(name: &str, payload: Value) -> Option<Self> {
        match EventName::from_wire(name)? {
            EventName::ReceiveMessage => Some(Self::MessageReceived(payload)),
            EventName::ReadMessage => Some(Self::MessageRead(payload)),
            EventName::IsWriting => Some(Self::WritingChanged(payload)),
            _ => None,
        }
    }

    /// Wire name of this event.
    pub const fn name(&self) -> EventName {
        match self {
            Self::MessageReceived(_) => EventName::ReceiveMessage,
            Self::MessageRead(_) => EventName::ReadMessage,
            Self::WritingChanged(_) => EventName::IsWriting,
        }
    }

    /// Opaque payload as received.
    pub const fn payload(&self) -> &Value {
        match self {
            Self::MessageReceived(v) | Self::MessageRead(v) | Self::WritingChanged(v) => v,
        }
    }
}
