//! Room and credential values consumed by the chat core.
//!
//! Only the fields the connection manager needs are modeled here; full room
//! and profile data belong to the application layer.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Room identifier.
pub type RoomId = String;

/// Message identifier.
pub type MessageId = String;

/// Most recent message known for a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    /// Message id.
    pub id: MessageId,
    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

/// A conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Room id.
    pub id: RoomId,
    /// Last known message, used to acknowledge history on join.
    pub last_message: Option<LastMessage>,
}

impl Room {
    /// Room with no known messages.
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self { id: id.into(), last_message: None }
    }

    /// Attach the last known message.
    #[must_use]
    pub fn with_last_message(mut self, id: impl Into<MessageId>, created_at: DateTime<Utc>) -> Self {
        self.last_message = Some(LastMessage { id: id.into(), created_at });
        self
    }
}

/// Access credential passed to the endpoint when connecting.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    /// Bearer token value.
    pub access_token: String,
    /// Lifetime in seconds, as issued.
    pub expires_in: u64,
}

impl AuthToken {
    /// Create a token.
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self { access_token: access_token.into(), expires_in }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// ISO-8601 timestamp with millisecond precision and a `Z` suffix, matching
/// what the mobile app sends.
pub fn iso_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
