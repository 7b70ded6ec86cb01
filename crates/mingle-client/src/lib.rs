//! Async runtime for the Mingle chat connection.
//!
//! [`Runtime`] owns a [`mingle_core::ChatConnection`] and drives it from a
//! single tokio task: application commands, transport events and timer
//! deadlines are processed one at a time, which preserves the single-threaded
//! ordering guarantees of the core. [`ChatClient`] is the cloneable handle the
//! application holds.
//!
//! With the `transport` feature, [`ws`] provides the production Socket.IO
//! websocket transport and [`spawn_websocket`] wires everything together.
//!
//! # Components
//!
//! - [`Runtime`]: event loop over commands, transport events and timers
//! - [`ChatClient`]: async handle for the application
//! - [`EventSource`]: where the runtime receives transport events from
//! - [`ws`]: tokio-tungstenite transport (feature `transport`)

mod command;
mod error;
mod handle;
mod runtime;
#[cfg(feature = "transport")]
pub mod ws;

pub use error::ClientError;
pub use handle::ChatClient;
pub use mingle_core::{
    AuthToken, ChatConfig, ConnectionState, EndpointConfig, ListenerSet, Room, TransportEvent,
};
pub use runtime::{EventSource, Runtime};

/// Spawn a runtime connected through the websocket transport.
///
/// Fails only if the configured endpoint can never yield a websocket URL.
/// Must be called from within a tokio runtime.
#[cfg(feature = "transport")]
pub fn spawn_websocket(
    config: ChatConfig,
) -> Result<(ChatClient, tokio::task::JoinHandle<()>), ClientError> {
    let probe = mingle_core::TransportOptions::new(&config.endpoint, &AuthToken::new("", 0));
    probe.websocket_url()?;

    let (connector, events) = ws::websocket();
    let (runtime, client) = Runtime::new(mingle_core::SystemEnv, config, connector, events);
    Ok((client, tokio::spawn(runtime.run())))
}
