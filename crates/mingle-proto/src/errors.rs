//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire packets.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame was empty.
    #[error("empty packet")]
    Empty,

    /// Leading Engine.IO type digit is not a known packet type.
    #[error("unknown engine packet type {0:?}")]
    UnknownEngineType(char),

    /// Socket.IO type digit is not a known packet type.
    #[error("unknown socket packet type {0:?}")]
    UnknownSocketType(char),

    /// Binary attachments are not used by the chat protocol.
    #[error("binary socket packets are not supported")]
    BinaryUnsupported,

    /// Namespace segment was opened but never terminated by a comma.
    #[error("unterminated namespace in packet")]
    UnterminatedNamespace,

    /// Event packet did not carry a `["name", payload]` array.
    #[error("malformed event: {0}")]
    MalformedEvent(&'static str),

    /// Packet body is a bare scalar instead of an array, object or string.
    #[error("packet data must be an array, object or string")]
    InvalidData,

    /// JSON body failed to parse or serialize.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
