//! Recording transport.
//!
//! Every call the connection manager makes on its transport is appended to a
//! shared [`TransportLog`]. Nothing is sent anywhere; tests play the server by
//! feeding [`mingle_core::TransportEvent`]s back in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mingle_core::{AuthToken, Connector, Transport, TransportOptions};
use mingle_proto::OutboundEvent;

/// One call made on a recording transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    /// Transport created.
    Open(TransportOptions),
    /// Reconnect requested with this access token.
    Reconnect(String),
    /// Transport closed.
    Close,
    /// Event emitted.
    Emit(OutboundEvent),
}

/// Shared, ordered record of transport calls.
#[derive(Debug, Clone, Default)]
pub struct TransportLog {
    calls: Arc<Mutex<Vec<TransportCall>>>,
}

impl TransportLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TransportCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: TransportCall) {
        self.lock().push(call);
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().clone()
    }

    /// Emitted events, in order.
    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                TransportCall::Emit(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of transports created.
    pub fn opens(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Open(_)))
    }

    /// Number of reconnects requested.
    pub fn reconnects(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Reconnect(_)))
    }

    /// Number of closes requested.
    pub fn closes(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Close))
    }

    /// Number of connection attempts, first open and reconnects together.
    pub fn attempts(&self) -> usize {
        self.opens() + self.reconnects()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.lock().iter().filter(|call| pred(call)).count()
    }
}

/// Connector producing [`RecordingTransport`]s that share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    log: TransportLog,
}

impl RecordingConnector {
    /// Connector with a fresh log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log shared by all transports from this connector.
    pub fn log(&self) -> TransportLog {
        self.log.clone()
    }
}

impl Connector for RecordingConnector {
    type Transport = RecordingTransport;

    fn open(&mut self, options: TransportOptions) -> RecordingTransport {
        tracing::debug!(?options, "recording transport opened");
        self.log.push(TransportCall::Open(options));
        RecordingTransport { log: self.log.clone() }
    }
}

/// Transport that records calls.
#[derive(Debug)]
pub struct RecordingTransport {
    log: TransportLog,
}

impl Transport for RecordingTransport {
    fn reconnect(&mut self, token: &AuthToken) {
        self.log.push(TransportCall::Reconnect(token.access_token.clone()));
    }

    fn close(&mut self) {
        self.log.push(TransportCall::Close);
    }

    fn emit(&mut self, event: &OutboundEvent) {
        self.log.push(TransportCall::Emit(event.clone()));
    }
}
