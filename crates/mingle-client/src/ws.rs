//! Socket.IO websocket transport.
//!
//! Each open or reconnect spawns one socket task that performs the Engine.IO
//! handshake, joins the namespace, answers heartbeats and forwards frames
//! both ways. A server silent for longer than its advertised ping interval
//! plus ping timeout is reported as a lost connection. Events are tagged with the generation of the task that produced
//! them; [`WsEvents`] drops anything from a superseded or closed socket, so a
//! late failure from an abandoned attempt can never be mistaken for the
//! current one.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use mingle_core::{AuthToken, Connector, Transport, TransportEvent, TransportOptions};
use mingle_proto::{EnginePacket, InboundEvent, OutboundEvent, SocketPacket, SocketPacketKind};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle, time::Instant};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{error::ClientError, runtime::EventSource};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector and the matching event source.
pub fn websocket() -> (WsConnector, WsEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    let generation = Arc::new(AtomicU64::new(0));
    (WsConnector { events: tx, generation: generation.clone() }, WsEvents { rx, generation })
}

#[derive(Debug)]
struct Signal {
    generation: u64,
    event: TransportEvent,
}

/// Creates [`WsTransport`]s.
#[derive(Debug)]
pub struct WsConnector {
    events: mpsc::UnboundedSender<Signal>,
    generation: Arc<AtomicU64>,
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn open(&mut self, options: TransportOptions) -> WsTransport {
        let mut transport = WsTransport {
            options,
            events: self.events.clone(),
            generation: self.generation.clone(),
            outbound: None,
            task: None,
        };
        transport.start();
        transport
    }
}

/// Events from the current socket task only.
#[derive(Debug)]
pub struct WsEvents {
    rx: mpsc::UnboundedReceiver<Signal>,
    generation: Arc<AtomicU64>,
}

impl EventSource for WsEvents {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            let signal = self.rx.recv().await?;
            if signal.generation == self.generation.load(Ordering::SeqCst) {
                return Some(signal.event);
            }
            debug!(generation = signal.generation, event = ?signal.event, "dropping stale socket event");
        }
    }
}

#[derive(Debug)]
enum Outgoing {
    Frame(String),
    Close,
}

/// A Socket.IO client over one websocket at a time.
#[derive(Debug)]
pub struct WsTransport {
    options: TransportOptions,
    events: mpsc::UnboundedSender<Signal>,
    generation: Arc<AtomicU64>,
    outbound: Option<mpsc::UnboundedSender<Outgoing>>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    fn start(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);

        let reporter = Reporter { generation, events: self.events.clone() };
        self.task = Some(tokio::spawn(run_socket(self.options.clone(), rx, reporter)));
    }
}

impl Transport for WsTransport {
    fn reconnect(&mut self, token: &AuthToken) {
        self.options.set_token(token);
        self.start();
    }

    fn close(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outgoing::Close);
        }
    }

    fn emit(&mut self, event: &OutboundEvent) {
        let frame = SocketPacket::event(self.options.namespace.clone(), event)
            .map(EnginePacket::Message)
            .and_then(|packet| packet.encode());

        match (frame, &self.outbound) {
            (Ok(frame), Some(outbound)) => {
                if outbound.send(Outgoing::Frame(frame)).is_err() {
                    debug!(event = %event.name(), "socket task gone, dropping emit");
                }
            },
            (Ok(_), None) => debug!(event = %event.name(), "socket closed, dropping emit"),
            (Err(error), _) => warn!(event = %event.name(), %error, "failed to encode event"),
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Reporter {
    generation: u64,
    events: mpsc::UnboundedSender<Signal>,
}

impl Reporter {
    fn report(&self, event: TransportEvent) {
        let _ = self.events.send(Signal { generation: self.generation, event });
    }
}

async fn run_socket(
    options: TransportOptions,
    mut outbound: mpsc::UnboundedReceiver<Outgoing>,
    reporter: Reporter,
) {
    let mut buffered = Vec::new();
    let session = tokio::select! {
        session = open_session(&options) => session,
        () = buffer_until_close(&mut outbound, &mut buffered) => {
            debug!(generation = reporter.generation, "closed before connecting");
            return;
        },
    };

    let (mut socket, heartbeat) = match session {
        Ok(session) => session,
        Err(error) => {
            warn!(%error, "chat connection attempt failed");
            reporter.report(TransportEvent::Closed { reason: error.to_string() });
            return;
        },
    };

    info!(namespace = %options.namespace, "chat socket connected");
    reporter.report(TransportEvent::Connected);

    for frame in buffered {
        if let Err(error) = socket.send(Message::text(frame)).await {
            reporter.report(TransportEvent::Disconnected { reason: error.to_string() });
            return;
        }
    }

    let reason = pump(&mut socket, &options.namespace, heartbeat, &mut outbound, &reporter).await;
    info!(%reason, "chat socket disconnected");
    reporter.report(TransportEvent::Disconnected { reason });
}

/// Hold emits made before the namespace is joined; return on close.
async fn buffer_until_close(
    outbound: &mut mpsc::UnboundedReceiver<Outgoing>,
    buffered: &mut Vec<String>,
) {
    while let Some(Outgoing::Frame(frame)) = outbound.recv().await {
        buffered.push(frame);
    }
}

async fn open_session(
    options: &TransportOptions,
) -> Result<(Socket, Option<Duration>), ClientError> {
    let url = options.websocket_url()?;
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

    let heartbeat = match next_packet(&mut socket).await? {
        EnginePacket::Open(info) => {
            debug!(
                sid = %info.sid,
                ping_interval = info.ping_interval,
                ping_timeout = info.ping_timeout,
                "engine session opened"
            );
            info.heartbeat_window()
        },
        other => return Err(ClientError::Handshake(format!("expected open, got {other:?}"))),
    };

    let join = EnginePacket::Message(SocketPacket::connect(options.namespace.clone())).encode()?;
    socket.send(Message::text(join)).await?;

    loop {
        match next_packet(&mut socket).await? {
            EnginePacket::Ping(data) => {
                socket.send(Message::text(EnginePacket::Pong(data).encode()?)).await?;
            },
            EnginePacket::Message(packet) if packet.namespace == options.namespace => {
                match packet.kind {
                    SocketPacketKind::Connect => return Ok((socket, heartbeat)),
                    SocketPacketKind::ConnectError => {
                        let message = packet.connect_error_message().unwrap_or("refused");
                        return Err(ClientError::Handshake(message.to_string()));
                    },
                    _ => {},
                }
            },
            EnginePacket::Close => {
                return Err(ClientError::Handshake("closed during handshake".to_string()));
            },
            _ => {},
        }
    }
}

async fn next_packet(socket: &mut Socket) -> Result<EnginePacket, ClientError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return Ok(EnginePacket::decode(&text)?),
            Some(Ok(Message::Close(_))) | None => {
                return Err(ClientError::Handshake("socket closed".to_string()));
            },
            Some(Ok(_)) => {},
            Some(Err(error)) => return Err(error.into()),
        }
    }
}

/// Forward frames until the socket ends; returns the reason.
///
/// Any inbound frame proves the server alive. Silence longer than the
/// heartbeat window ends the session as a ping timeout.
async fn pump(
    socket: &mut Socket,
    namespace: &str,
    heartbeat: Option<Duration>,
    outbound: &mut mpsc::UnboundedReceiver<Outgoing>,
    reporter: &Reporter,
) -> String {
    let mut deadline = heartbeat.map(|window| Instant::now() + window);

    loop {
        tokio::select! {
            () = heartbeat_expired(deadline) => {
                warn!(window = ?heartbeat, "no frame from server within heartbeat window");
                return "ping timeout".to_string();
            },
            frame = socket.next() => {
                if let Some(window) = heartbeat {
                    deadline = Some(Instant::now() + window);
                }
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reason) = on_frame(socket, namespace, &text, reporter).await {
                            return reason;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => return "socket closed".to_string(),
                    Some(Ok(_)) => {},
                    Some(Err(error)) => return error.to_string(),
                }
            },
            outgoing = outbound.recv() => match outgoing {
                Some(Outgoing::Frame(frame)) => {
                    if let Err(error) = socket.send(Message::text(frame)).await {
                        return error.to_string();
                    }
                },
                Some(Outgoing::Close) | None => {
                    let leave = EnginePacket::Message(SocketPacket::disconnect(namespace)).encode();
                    if let Ok(leave) = leave {
                        let _ = socket.send(Message::text(leave)).await;
                    }
                    let _ = socket.close(None).await;
                    return "client disconnect".to_string();
                },
            },
        }
    }
}

async fn heartbeat_expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Handle one inbound frame; `Some(reason)` ends the session.
async fn on_frame(
    socket: &mut Socket,
    namespace: &str,
    text: &str,
    reporter: &Reporter,
) -> Option<String> {
    let packet = match EnginePacket::decode(text) {
        Ok(packet) => packet,
        Err(error) => {
            warn!(%error, "undecodable frame");
            return None;
        },
    };

    match packet {
        EnginePacket::Ping(data) => {
            let pong = EnginePacket::Pong(data).encode().ok()?;
            if let Err(error) = socket.send(Message::text(pong)).await {
                return Some(error.to_string());
            }
        },
        EnginePacket::Close => return Some("server closed session".to_string()),
        EnginePacket::Message(packet) if packet.namespace == namespace => match packet.kind {
            SocketPacketKind::Event => match packet.into_event() {
                Ok((name, payload)) => match InboundEvent::from_wire(&name, payload) {
                    Some(event) => reporter.report(TransportEvent::Inbound(event)),
                    None => debug!(%name, "ignoring unhandled event"),
                },
                Err(error) => warn!(%error, "malformed event"),
            },
            SocketPacketKind::Disconnect => return Some("server disconnect".to_string()),
            _ => {},
        },
        _ => {},
    }
    None
}
