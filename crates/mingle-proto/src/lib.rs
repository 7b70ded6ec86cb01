//! Wire format for Mingle chat.
//!
//! The chat endpoint speaks Socket.IO v4 on top of Engine.IO v4 text frames.
//! Every domain operation is a named event carrying a small JSON object, so
//! this crate has two layers:
//!
//! - [`events`] and [`payloads`]: the event names and DTOs exchanged with the
//!   server. Names are reproduced verbatim for compatibility with existing
//!   deployments.
//! - [`packet`]: the text framing that wraps those events on the websocket.
//!
//! Nothing here performs I/O. Decoding is total: any input string either
//! yields a packet or a [`ProtocolError`], never a panic.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod events;
pub mod packet;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use events::EventName;
pub use packet::{EnginePacket, OpenInfo, SocketPacket, SocketPacketKind};
pub use payloads::{InboundEvent, OutboundEvent};
