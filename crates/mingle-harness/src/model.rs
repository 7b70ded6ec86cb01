//! Reference model of the connection lifecycle.
//!
//! A deliberately naive re-statement of the lifecycle rules in terms of
//! millisecond counters and plain vectors. Model-based tests apply the same
//! [`Operation`] sequence to the model and to a [`crate::World`] and compare
//! the observable outcome: state, callback resolutions, transport calls and
//! writing signals.

use mingle_core::ConnectionState;

/// An operation applied to both the model and the real connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Application calls `connect()`.
    Connect,
    /// Application calls `disconnect()`.
    Disconnect,
    /// Server accepts the pending attempt.
    ServerAccepts,
    /// Transport reports a close.
    ServerCloses,
    /// Virtual time passes.
    AdvanceMs(u64),
    /// Typing activity in room `n`.
    SetWriting(u8),
}

/// Room id used for `SetWriting(n)`.
pub fn room_name(n: u8) -> String {
    format!("room-{n}")
}

/// Reference model.
#[derive(Debug, Clone)]
pub struct ModelConnection {
    connect_timeout_ms: u64,
    writing_idle_ms: u64,
    max_retries: u32,

    now_ms: u64,
    state: ConnectionState,
    has_transport: bool,
    attempt_deadline: Option<u64>,
    retries_remaining: u32,

    pending: Vec<usize>,
    next_callback: usize,
    resolved: Vec<(usize, bool)>,

    announced: bool,
    writing_room: Option<String>,
    writing_deadline: Option<u64>,
    writing_signals: Vec<(String, bool)>,

    opens: usize,
    reconnects: usize,
    closes: usize,
}

impl ModelConnection {
    /// Model with the given timing constants.
    pub fn new(connect_timeout_ms: u64, writing_idle_ms: u64, max_retries: u32) -> Self {
        Self {
            connect_timeout_ms,
            writing_idle_ms,
            max_retries,
            now_ms: 0,
            state: ConnectionState::Disconnected,
            has_transport: false,
            attempt_deadline: None,
            retries_remaining: 0,
            pending: Vec::new(),
            next_callback: 0,
            resolved: Vec::new(),
            announced: false,
            writing_room: None,
            writing_deadline: None,
            writing_signals: Vec::new(),
            opens: 0,
            reconnects: 0,
            closes: 0,
        }
    }

    /// Expected connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Expected callback resolutions, `(callback index, connected)`.
    pub fn resolved(&self) -> &[(usize, bool)] {
        &self.resolved
    }

    /// Expected `isWriting` emissions, `(room, state)`.
    pub fn writing_signals(&self) -> &[(String, bool)] {
        &self.writing_signals
    }

    /// Expected transport creations.
    pub fn opens(&self) -> usize {
        self.opens
    }

    /// Expected reconnects.
    pub fn reconnects(&self) -> usize {
        self.reconnects
    }

    /// Expected closes.
    pub fn closes(&self) -> usize {
        self.closes
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::Connect => self.connect(),
            Operation::Disconnect => self.disconnect(),
            Operation::ServerAccepts => self.accept(),
            Operation::ServerCloses => self.close(),
            Operation::AdvanceMs(ms) => self.advance(*ms),
            Operation::SetWriting(n) => self.set_writing(room_name(*n)),
        }
    }

    fn connect(&mut self) {
        let id = self.next_callback;
        self.next_callback += 1;

        match self.state {
            ConnectionState::Connected => self.resolved.push((id, true)),
            ConnectionState::Connecting => self.pending.push(id),
            ConnectionState::Disconnected => {
                self.pending.push(id);
                self.start_attempt(self.max_retries);
            },
        }
    }

    fn start_attempt(&mut self, retries: u32) {
        if self.has_transport {
            self.reconnects += 1;
        } else {
            self.opens += 1;
            self.has_transport = true;
        }
        self.state = ConnectionState::Connecting;
        self.retries_remaining = retries;
        self.attempt_deadline = Some(self.now_ms + self.connect_timeout_ms);
    }

    fn resolve(&mut self, connected: bool) {
        for id in self.pending.drain(..) {
            self.resolved.push((id, connected));
        }
    }

    fn accept(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.attempt_deadline = None;
            self.state = ConnectionState::Connected;
            self.resolve(true);
        }
    }

    fn close(&mut self) {
        match self.state {
            ConnectionState::Disconnected => {},
            ConnectionState::Connecting => {
                self.attempt_deadline = None;
                self.state = ConnectionState::Disconnected;
                self.resolve(false);
                self.clear_writing();
            },
            ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                self.clear_writing();
            },
        }
    }

    fn disconnect(&mut self) {
        if self.state == ConnectionState::Connected
            && self.announced
            && let Some(room) = self.writing_room.clone()
        {
            self.emit_writing(room, false);
        }
        self.clear_writing();

        match self.state {
            ConnectionState::Disconnected => {},
            ConnectionState::Connecting => {
                self.attempt_deadline = None;
                self.state = ConnectionState::Disconnected;
                self.resolve(false);
                self.closes += 1;
            },
            ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                self.closes += 1;
            },
        }
    }

    fn set_writing(&mut self, room: String) {
        if self.announced && self.writing_room.as_deref() != Some(room.as_str()) {
            if let Some(previous) = self.writing_room.take() {
                self.emit_writing(previous, false);
            }
            self.announced = false;
        }

        self.writing_deadline = Some(self.now_ms + self.writing_idle_ms);
        self.writing_room = Some(room.clone());

        if !self.announced {
            self.announced = true;
            self.emit_writing(room, true);
        }
    }

    fn clear_writing(&mut self) {
        self.announced = false;
        self.writing_deadline = None;
    }

    fn emit_writing(&mut self, room: String, state: bool) {
        if self.has_transport {
            self.writing_signals.push((room, state));
        }
    }

    fn advance(&mut self, ms: u64) {
        let target = self.now_ms + ms;

        loop {
            let next = match (self.writing_deadline, self.attempt_deadline) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => break,
            };
            if next > target {
                break;
            }
            self.now_ms = next;

            if self.writing_deadline.is_some_and(|d| d <= next) {
                self.writing_deadline = None;
                if self.announced {
                    self.announced = false;
                    if let Some(room) = self.writing_room.clone() {
                        self.emit_writing(room, false);
                    }
                }
            }

            if self.attempt_deadline.is_some_and(|d| d <= next) {
                self.attempt_deadline = None;
                if self.retries_remaining > 0 {
                    self.start_attempt(self.retries_remaining - 1);
                } else {
                    self.state = ConnectionState::Disconnected;
                    self.resolve(false);
                    self.closes += 1;
                }
            }
        }

        self.now_ms = target;
    }
}
