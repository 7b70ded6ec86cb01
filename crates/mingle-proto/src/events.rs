//! Event names exchanged with the chat endpoint.
//!
//! Names are part of the wire contract and must match the server exactly.
//! `readMessage` and `isWriting` travel in both directions: outbound they
//! announce the local user's read-receipt or typing state, inbound they carry
//! the remote party's.

use std::fmt;

/// Every named event the chat client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Transport established the namespace connection.
    Connect,
    /// Transport was closed before or instead of connecting.
    Close,
    /// Established connection was lost.
    Disconnect,
    /// Subscribe to a room's traffic.
    JoinRoom,
    /// Unsubscribe from a room's traffic.
    LeaveRoom,
    /// Post a message to a room.
    SendMessage,
    /// Read-receipt for a specific message.
    ReadMessage,
    /// Typing presence for a room.
    IsWriting,
    /// New message pushed by the server.
    ReceiveMessage,
}

impl EventName {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Close => "close",
            Self::Disconnect => "disconnect",
            Self::JoinRoom => "joinRoom",
            Self::LeaveRoom => "leaveRoom",
            Self::SendMessage => "sendMessage",
            Self::ReadMessage => "readMessage",
            Self::IsWriting => "isWriting",
            Self::ReceiveMessage => "receiveMessage",
        }
    }

    /// Parse a wire name. Unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(Self::Connect),
            "close" => Some(Self::Close),
            "disconnect" => Some(Self::Disconnect),
            "joinRoom" => Some(Self::JoinRoom),
            "leaveRoom" => Some(Self::LeaveRoom),
            "sendMessage" => Some(Self::SendMessage),
            "readMessage" => Some(Self::ReadMessage),
            "isWriting" => Some(Self::IsWriting),
            "receiveMessage" => Some(Self::ReceiveMessage),
            _ => None,
        }
    }

    /// Whether the server pushes this event to clients.
    pub const fn is_inbound(self) -> bool {
        matches!(self, Self::ReceiveMessage | Self::ReadMessage | Self::IsWriting)
    }

    /// Whether this is a connection-level signal rather than a domain event.
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::Connect | Self::Close | Self::Disconnect)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EventName; 9] = [
        EventName::Connect,
        EventName::Close,
        EventName::Disconnect,
        EventName::JoinRoom,
        EventName::LeaveRoom,
        EventName::SendMessage,
        EventName::ReadMessage,
        EventName::IsWriting,
        EventName::ReceiveMessage,
    ];

    #[test]
    fn wire_names_parse_back() {
        for name in ALL {
            assert_eq!(EventName::from_wire(name.as_str()), Some(name));
        }
    }

    #[test]
    fn wire_names_are_case_sensitive() {
        assert_eq!(EventName::from_wire("joinroom"), None);
        assert_eq!(EventName::from_wire("JoinRoom"), None);
    }

    #[test]
    fn inbound_set_is_fixed() {
        let inbound: Vec<_> = ALL.into_iter().filter(|n| n.is_inbound()).collect();
        assert_eq!(
            inbound,
            vec![EventName::ReadMessage, EventName::IsWriting, EventName::ReceiveMessage]
        );
    }
}
