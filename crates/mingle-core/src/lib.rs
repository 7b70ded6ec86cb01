//! Mingle chat core logic
//!
//! Pure state machine logic for the realtime chat connection, decoupled from
//! sockets and timers so that every lifecycle edge case can be driven
//! deterministically.
//!
//! # Architecture
//!
//! Time is supplied by the caller: methods that can arm or expire a timer
//! take `now: Instant`, and a driver calls [`ChatConnection::tick`] when
//! [`ChatConnection::next_deadline`] passes. The underlying socket is reached
//! only through the [`Transport`] and [`Connector`] traits; its lifecycle and
//! push events are fed back through [`ChatConnection::handle_event`].
//!
//! All state transitions happen synchronously inside one of those calls, so
//! no locking is needed and ordering is exactly the order of calls.
//!
//! # Components
//!
//! - [`connection`]: connect lifecycle controller (state, retries, callbacks)
//! - [`router`]: inbound event dispatch to listeners
//! - [`writing`]: typing-state debouncer
//! - [`chat`]: the composed connection manager and room operations
//! - [`timer`]: cancellable deadline slots shared by the above
//! - [`transport`]: transport abstraction and connection options
//! - [`mod@env`]: environment abstraction (time)

pub mod chat;
pub mod config;
pub mod connection;
pub mod env;
pub mod error;
pub mod room;
pub mod router;
pub mod timer;
pub mod transport;
pub mod writing;

pub use chat::ChatConnection;
pub use config::{ChatConfig, EndpointConfig};
pub use connection::{ConnectCallback, ConnectController, ConnectionState};
pub use env::{Environment, SystemEnv};
pub use error::TransportError;
pub use room::{AuthToken, LastMessage, MessageId, Room, RoomId};
pub use router::{EventRouter, Listener, ListenerSet};
pub use transport::{Connector, Transport, TransportEvent, TransportOptions};
pub use writing::{WritingDebouncer, WritingSignal};
