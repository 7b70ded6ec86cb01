//! Transport abstraction for the chat socket.
//!
//! The connection manager drives exactly one socket-like channel at a time.
//! Production uses a Socket.IO websocket, tests use a recording fake. Both
//! are non-blocking: every method returns immediately and the outcome of a
//! connection attempt comes back later as a [`TransportEvent`] fed into
//! [`crate::ChatConnection::handle_event`].

use std::fmt;

use mingle_proto::{InboundEvent, OutboundEvent};
use url::Url;

use crate::{config::EndpointConfig, error::TransportError, room::AuthToken};

/// A single bidirectional channel to the chat endpoint.
///
/// A transport starts connecting as soon as it is created. It must never
/// reconnect on its own; every retry is requested explicitly through
/// [`Transport::reconnect`].
pub trait Transport: Send + 'static {
    /// Abandon any in-flight attempt and connect again with `token`.
    fn reconnect(&mut self, token: &AuthToken);

    /// Close the channel. Further emits are dropped until a reconnect.
    fn close(&mut self);

    /// Send an event. Fire-and-forget; no acknowledgement is awaited.
    fn emit(&mut self, event: &OutboundEvent);
}

/// Factory for transports.
pub trait Connector: Send + 'static {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Create a transport and start its first connection attempt.
    fn open(&mut self, options: TransportOptions) -> Self::Transport;
}

/// Signals a transport reports back to the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// `connect`: the chat namespace accepted the connection.
    Connected,
    /// `close`: the attempt was refused or the channel closed before
    /// connecting.
    Closed {
        /// Human-readable cause.
        reason: String,
    },
    /// `disconnect`: an established connection was lost.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
    /// A domain event pushed by the server.
    Inbound(InboundEvent),
}

/// Everything needed to open a transport.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Base URL of the server.
    pub base_url: String,
    /// Socket.IO namespace.
    pub namespace: String,
    /// Socket.IO handshake path.
    pub path: String,
    /// Access token sent as the `authorization` query parameter.
    pub authorization: String,
    /// Transport-level automatic reconnection. Always `false`; retries are
    /// owned by the connection manager.
    pub reconnection: bool,
}

impl TransportOptions {
    /// Options for `endpoint` authenticated with `token`.
    pub fn new(endpoint: &EndpointConfig, token: &AuthToken) -> Self {
        Self {
            base_url: endpoint.base_url.clone(),
            namespace: endpoint.namespace.clone(),
            path: endpoint.path.clone(),
            authorization: token.access_token.clone(),
            reconnection: false,
        }
    }

    /// Replace the credential for the next attempt.
    pub fn set_token(&mut self, token: &AuthToken) {
        self.authorization.clone_from(&token.access_token);
    }

    /// Websocket URL of the Engine.IO handshake.
    ///
    /// `http`/`https` base URLs are mapped to `ws`/`wss`.
    pub fn websocket_url(&self) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.base_url)?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(TransportError::UnsupportedScheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|()| TransportError::UnsupportedScheme(scheme.to_string()))?;

        url.set_path(&self.path);
        url.query_pairs_mut()
            .clear()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket")
            .append_pair("authorization", &self.authorization);

        Ok(url)
    }
}

impl fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("base_url", &self.base_url)
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .field("authorization", &"<redacted>")
            .field("reconnection", &self.reconnection)
            .finish()
    }
}
