//! Runtime loop.
//!
//! One task owns the [`ChatConnection`] and multiplexes three inputs:
//!
//! ```text
//!  ChatClient ──commands──┐
//!                         ├──► ChatConnection ──► Transport
//!  EventSource ─events────┤
//!                         │
//!  Environment ─deadline──┘   (tick at next_deadline)
//! ```
//!
//! Each input is applied to completion before the next is taken, so connect
//! callbacks and listeners never run concurrently with each other.

use std::{future::Future, time::Duration};

use mingle_core::{ChatConfig, ChatConnection, Connector, Environment, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{command::Command, handle::ChatClient};

/// Where the runtime receives transport events from.
pub trait EventSource: Send + 'static {
    /// Next event, or `None` once no more can arrive.
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;
}

impl EventSource for mpsc::UnboundedReceiver<TransportEvent> {
    fn next_event(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send {
        self.recv()
    }
}

/// Drives a [`ChatConnection`] from commands, transport events and timers.
pub struct Runtime<E: Environment, C: Connector, S: EventSource> {
    env: E,
    chat: ChatConnection<C>,
    events: S,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl<E: Environment, C: Connector, S: EventSource> Runtime<E, C, S> {
    /// Runtime and its first client handle.
    pub fn new(env: E, config: ChatConfig, connector: C, events: S) -> (Self, ChatClient) {
        let (tx, commands) = mpsc::unbounded_channel();
        let runtime = Self { env, chat: ChatConnection::new(config, connector), events, commands };
        (runtime, ChatClient::new(tx))
    }

    /// Run until every [`ChatClient`] handle is dropped.
    ///
    /// On shutdown the connection is disconnected, which resolves any
    /// pending connect callers with `false`.
    pub async fn run(mut self) {
        let mut events_open = true;

        loop {
            let delay = self
                .chat
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(self.env.now()));
            let env = &self.env;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                event = self.events.next_event(), if events_open => match event {
                    Some(event) => self.chat.handle_event(event),
                    None => {
                        debug!("transport event source closed");
                        events_open = false;
                    },
                },
                () = sleep_until(env, delay) => {
                    let now = self.env.now();
                    self.chat.tick(now);
                },
            }
        }

        info!("all chat handles dropped, shutting down");
        self.chat.disconnect();
    }

    fn apply(&mut self, command: Command) {
        let now = self.env.now();
        match command {
            Command::Connect { token, listeners, reply } => {
                self.chat.connect(now, &token, listeners, move |connected: bool| {
                    let _ = reply.send(connected);
                });
            },
            Command::Disconnect { reply } => {
                self.chat.disconnect();
                let _ = reply.send(());
            },
            Command::DiscardTransport => self.chat.discard_transport(),
            Command::JoinRoom(room) => self.chat.join_room(&room),
            Command::LeaveRoom(room_id) => self.chat.leave_room(&room_id),
            Command::SendMessage { room_id, id, text } => {
                self.chat.send_message(&room_id, &id, &text);
            },
            Command::ReadMessage { room_id, message_id, created_at } => {
                self.chat.read_message(&room_id, &message_id, &created_at);
            },
            Command::SetWriting(room_id) => self.chat.set_writing(now, &room_id),
            Command::State(reply) => {
                let _ = reply.send(self.chat.state());
            },
        }
    }
}

async fn sleep_until<E: Environment>(env: &E, delay: Option<Duration>) {
    match delay {
        Some(delay) => env.sleep(delay).await,
        None => std::future::pending().await,
    }
}
