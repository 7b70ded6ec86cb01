//! Client error types.

use mingle_core::TransportError;
use mingle_proto::ProtocolError;
use thiserror::Error;

/// Errors from setting up or running the websocket transport.
///
/// None of these reach connect callers directly; a failed attempt is reported
/// as a `false` connect outcome and the error is logged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint configuration is unusable.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Packet failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Websocket layer failed.
    #[cfg(feature = "transport")]
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Server did not complete the Engine.IO / Socket.IO handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),
}
