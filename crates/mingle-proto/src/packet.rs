//! Engine.IO / Socket.IO text framing.
//!
//! Each websocket text frame is one Engine.IO packet: a single type digit
//! followed by an optional body. Engine.IO `message` packets carry a
//! Socket.IO packet, which has its own type digit, an optional namespace, an
//! optional ack id and an optional JSON body:
//!
//! ```text
//! 4 2 /chat, 17 ["sendMessage",{"roomId":"r1","id":"m1","text":"hi"}]
//! │ │ │      │  └─ JSON data
//! │ │ │      └──── ack id (optional)
//! │ │ └─────────── namespace + ',' (omitted for "/")
//! │ └───────────── Socket.IO type (2 = EVENT)
//! └─────────────── Engine.IO type (4 = message)
//! ```
//!
//! Binary attachments are never used by the chat server, so binary packet
//! types are rejected instead of being half-supported.

use std::{fmt::Write as _, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::{ProtocolError, Result, payloads::OutboundEvent};

/// Handshake information sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    /// Engine.IO session id.
    pub sid: String,
    /// Transports the session may upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Server ping interval in milliseconds.
    pub ping_interval: u64,
    /// Grace period for answering a ping, in milliseconds.
    pub ping_timeout: u64,
    /// Largest payload the server accepts, in bytes.
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenInfo {
    /// How long the server may stay silent before the session is dead: one
    /// ping interval plus the ping timeout. `None` if the server advertised
    /// no heartbeat.
    pub fn heartbeat_window(&self) -> Option<Duration> {
        let window = self.ping_interval.saturating_add(self.ping_timeout);
        (window > 0).then(|| Duration::from_millis(window))
    }
}

/// One Engine.IO packet (one websocket text frame).
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// `0`: session opened.
    Open(OpenInfo),
    /// `1`: session closed.
    Close,
    /// `2`: heartbeat probe; the peer must answer with a pong carrying the
    /// same data.
    Ping(String),
    /// `3`: heartbeat answer.
    Pong(String),
    /// `4`: Socket.IO payload.
    Message(SocketPacket),
    /// `5`: transport upgrade.
    Upgrade,
    /// `6`: no-op.
    Noop,
}

impl EnginePacket {
    /// Decode a text frame.
    pub fn decode(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(body)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(body.to_string())),
            '3' => Ok(Self::Pong(body.to_string())),
            '4' => Ok(Self::Message(SocketPacket::decode(body)?)),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownEngineType(other)),
        }
    }

    /// Encode into a text frame.
    ///
    /// `Open` is server-to-client only; encoding it produces the bare type
    /// digit.
    pub fn encode(&self) -> Result<String> {
        let frame = match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{data}"),
            Self::Pong(data) => format!("3{data}"),
            Self::Message(packet) => format!("4{}", packet.encode()?),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        };
        Ok(frame)
    }
}

/// Socket.IO packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    /// Namespace connect request (client) or acceptance (server).
    Connect,
    /// Namespace disconnect.
    Disconnect,
    /// Named event.
    Event,
    /// Acknowledgement of an event.
    Ack,
    /// Namespace connection refused.
    ConnectError,
}

impl SocketPacketKind {
    const fn to_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
        }
    }

    fn from_char(c: char) -> Result<Self> {
        match c {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' => Ok(Self::Event),
            '3' => Ok(Self::Ack),
            '4' => Ok(Self::ConnectError),
            '5' | '6' => Err(ProtocolError::BinaryUnsupported),
            other => Err(ProtocolError::UnknownSocketType(other)),
        }
    }
}

/// One Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    /// Packet type.
    pub kind: SocketPacketKind,
    /// Namespace, `/` for the default one.
    pub namespace: String,
    /// Ack id, when the sender expects an acknowledgement.
    pub ack_id: Option<u64>,
    /// JSON body.
    pub data: Option<Value>,
}

impl SocketPacket {
    /// Namespace connect request.
    pub fn connect(namespace: impl Into<String>) -> Self {
        Self { kind: SocketPacketKind::Connect, namespace: namespace.into(), ack_id: None, data: None }
    }

    /// Namespace disconnect.
    pub fn disconnect(namespace: impl Into<String>) -> Self {
        Self {
            kind: SocketPacketKind::Disconnect,
            namespace: namespace.into(),
            ack_id: None,
            data: None,
        }
    }

    /// Wrap an outbound event as `["name", payload]`.
    pub fn event(namespace: impl Into<String>, event: &OutboundEvent) -> Result<Self> {
        let data = Value::Array(vec![Value::String(event.name().as_str().to_string()), event.payload()?]);
        Ok(Self {
            kind: SocketPacketKind::Event,
            namespace: namespace.into(),
            ack_id: None,
            data: Some(data),
        })
    }

    /// Split an `EVENT` packet into its name and first argument.
    ///
    /// A missing argument is reported as `Value::Null`. Extra arguments are
    /// dropped; the chat server never sends more than one.
    pub fn into_event(self) -> Result<(String, Value)> {
        if self.kind != SocketPacketKind::Event {
            return Err(ProtocolError::MalformedEvent("not an event packet"));
        }

        let Some(Value::Array(items)) = self.data else {
            return Err(ProtocolError::MalformedEvent("event data is not an array"));
        };

        let mut items = items.into_iter();
        let Some(Value::String(name)) = items.next() else {
            return Err(ProtocolError::MalformedEvent("event name missing"));
        };

        Ok((name, items.next().unwrap_or(Value::Null)))
    }

    /// Reason attached to a `CONNECT_ERROR` packet.
    pub fn connect_error_message(&self) -> Option<&str> {
        if self.kind != SocketPacketKind::ConnectError {
            return None;
        }
        match &self.data {
            Some(Value::Object(map)) => map.get("message").and_then(Value::as_str),
            Some(Value::String(message)) => Some(message),
            _ => None,
        }
    }

    /// Decode the body of an Engine.IO `message` packet.
    pub fn decode(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let kind = SocketPacketKind::from_char(chars.next().ok_or(ProtocolError::Empty)?)?;
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            if let Some(end) = rest.find(',') {
                let namespace = &rest[..end];
                rest = &rest[end + 1..];
                namespace.to_string()
            } else if rest.contains(['[', '{']) {
                return Err(ProtocolError::UnterminatedNamespace);
            } else {
                let namespace = rest;
                rest = "";
                namespace.to_string()
            }
        } else {
            "/".to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack_id = if digits == 0 {
            None
        } else {
            let id = rest[..digits]
                .parse::<u64>()
                .map_err(|_| ProtocolError::MalformedEvent("ack id out of range"))?;
            rest = &rest[digits..];
            Some(id)
        };

        // A leading scalar would be indistinguishable from ack id digits.
        let data = match rest.chars().next() {
            None => None,
            Some('[' | '{' | '"') => Some(serde_json::from_str(rest)?),
            Some(_) => return Err(ProtocolError::InvalidData),
        };

        Ok(Self { kind, namespace, ack_id, data })
    }

    /// Encode as the body of an Engine.IO `message` packet.
    pub fn encode(&self) -> Result<String> {
        let mut out = String::new();
        out.push(self.kind.to_char());

        if self.namespace != "/" && !self.namespace.is_empty() {
            out.push_str(&self.namespace);
            out.push(',');
        }

        if let Some(id) = self.ack_id {
            let _ = write!(out, "{id}");
        }

        if let Some(data) = &self.data {
            out.push_str(&serde_json::to_string(data)?);
        }

        Ok(out)
    }
}
