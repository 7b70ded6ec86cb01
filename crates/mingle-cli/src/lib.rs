//! Terminal chat client.
//!
//! Connects to the chat service, joins a room, prints what arrives and sends
//! every stdin line as a message. Lines starting with `/` are commands; see
//! [`commands::parse`].

pub mod args;
pub mod commands;
pub mod error;
pub mod render;
pub mod session;

pub use args::Args;
pub use commands::{Command, parse};
pub use error::CliError;
pub use session::run;
