//! Connect lifecycle controller.
//!
//! Owns the connection state, the bounded retry policy and the queue of
//! callers waiting for the outcome of the current attempt.
//!
//! # Architecture: Action-Based State Machine
//!
//! The controller performs no I/O. Methods take the current time where a
//! timer is involved and return a [`ConnectAction`] telling the owner what to
//! do with the transport. Connect callbacks are the one effect executed
//! in place: they are drained from the queue and invoked synchronously when
//! an attempt resolves.
//!
//! # State Machine
//!
//! ```text
//!                 connect()               transport "connect"
//! ┌──────────────┐───────>┌────────────┐─────────────────>┌───────────┐
//! │ Disconnected │        │ Connecting │                  │ Connected │
//! └──────────────┘<───────└────────────┘                  └───────────┘
//!        ↑         close / retries exhausted / disconnect()     │
//!        └──────────────────────────────────────────────────────┘
//!                         close / disconnect()
//! ```
//!
//! A timeout while connecting starts a new attempt as long as retries remain.
//! An explicit close from the transport is authoritative and never retried.

use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::timer::TimerSlot;

/// Callback receiving the outcome of a connection attempt.
pub type ConnectCallback = Box<dyn FnOnce(bool) + Send>;

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// An attempt is in flight and its timeout is armed.
    Connecting,
    /// Transport reported the namespace connection.
    Connected,
}

/// Transport work requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    /// Open the transport, or reconnect it if one already exists.
    StartAttempt {
        /// Attempt number, increasing across the controller's lifetime.
        attempt: u64,
        /// Retries left after this attempt.
        retries_remaining: u32,
    },
    /// Close the transport.
    CloseTransport,
}

#[derive(Debug, Clone, Copy)]
struct Attempt {
    id: u64,
    timer_token: u64,
    retries_remaining: u32,
}

/// Connection lifecycle state machine.
pub struct ConnectController {
    state: ConnectionState,
    connect_timeout: Duration,
    pending: VecDeque<ConnectCallback>,
    timer: TimerSlot,
    attempt: Option<Attempt>,
    attempts_started: u64,
}

impl ConnectController {
    /// Controller in `Disconnected` state.
    pub fn new(connect_timeout: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            connect_timeout,
            pending: VecDeque::new(),
            timer: TimerSlot::new(),
            attempt: None,
            attempts_started: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the transport is connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether an attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.state == ConnectionState::Connecting
    }

    /// Callers waiting for the current attempt.
    pub fn pending_callbacks(&self) -> usize {
        self.pending.len()
    }

    /// Attempts started so far, retries included.
    pub fn attempts_started(&self) -> u64 {
        self.attempts_started
    }

    /// Deadline of the in-flight attempt.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Request a connection.
    ///
    /// Already connected: `callback(true)` runs before this returns. Already
    /// connecting: the callback joins the in-flight attempt. Otherwise a new
    /// attempt starts with `retries` retries after it.
    pub fn connect(
        &mut self,
        now: Instant,
        callback: Option<ConnectCallback>,
        retries: u32,
    ) -> Option<ConnectAction> {
        if self.state == ConnectionState::Connected {
            if let Some(callback) = callback {
                callback(true);
            }
            return None;
        }

        if let Some(callback) = callback {
            self.pending.push_back(callback);
        }

        if self.state == ConnectionState::Connecting {
            debug!(pending = self.pending.len(), "joined in-flight connection attempt");
            return None;
        }

        Some(self.begin_attempt(now, retries))
    }

    /// Transport reported `connect`.
    ///
    /// Returns `false` when there was no attempt to complete, in which case
    /// nothing changed.
    pub fn on_connected(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            debug!(state = ?self.state, "ignoring connect signal outside an attempt");
            return false;
        }

        self.timer.cancel();
        self.attempt = None;
        self.state = ConnectionState::Connected;
        info!(attempts = self.attempts_started, "chat connected");
        self.resolve(true);
        true
    }

    /// Transport reported `close` or `disconnect`.
    ///
    /// Never retried. Returns `false` when already disconnected.
    pub fn on_closed(&mut self, reason: &str) -> bool {
        match self.state {
            ConnectionState::Disconnected => false,
            ConnectionState::Connecting => {
                self.timer.cancel();
                self.attempt = None;
                self.state = ConnectionState::Disconnected;
                warn!(reason, "connection attempt closed by transport");
                self.resolve(false);
                true
            },
            ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                info!(reason, "chat connection lost");
                true
            },
        }
    }

    /// Process the attempt timeout if it is due at `now`.
    ///
    /// Starts the next attempt while retries remain. Once exhausted, every
    /// waiting caller receives `false` and the silent transport is closed.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<ConnectAction> {
        let expired = self.timer.expire(now)?;

        let attempt = match self.attempt {
            Some(attempt) if attempt.timer_token == expired.token() => attempt,
            _ => {
                debug!(token = expired.token(), "discarding stale connect timeout");
                return None;
            },
        };

        if attempt.retries_remaining > 0 {
            debug!(
                attempt = attempt.id,
                retries_remaining = attempt.retries_remaining - 1,
                "connect attempt timed out, retrying"
            );
            return Some(self.begin_attempt(now, attempt.retries_remaining - 1));
        }

        self.attempt = None;
        self.state = ConnectionState::Disconnected;
        warn!(attempts = self.attempts_started, "connect retries exhausted");
        self.resolve(false);
        Some(ConnectAction::CloseTransport)
    }

    /// Tear down the connection or abort the in-flight attempt.
    ///
    /// Waiting callers receive `false` before this returns.
    pub fn disconnect(&mut self) -> Option<ConnectAction> {
        match self.state {
            ConnectionState::Disconnected => None,
            ConnectionState::Connecting => {
                self.timer.cancel();
                self.attempt = None;
                self.state = ConnectionState::Disconnected;
                debug!(pending = self.pending.len(), "aborting connection attempt");
                self.resolve(false);
                Some(ConnectAction::CloseTransport)
            },
            ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                Some(ConnectAction::CloseTransport)
            },
        }
    }

    fn begin_attempt(&mut self, now: Instant, retries_remaining: u32) -> ConnectAction {
        self.attempts_started += 1;
        let handle = self.timer.arm(now, self.connect_timeout);
        self.attempt =
            Some(Attempt { id: self.attempts_started, timer_token: handle.token(), retries_remaining });
        self.state = ConnectionState::Connecting;

        ConnectAction::StartAttempt { attempt: self.attempts_started, retries_remaining }
    }

    fn resolve(&mut self, connected: bool) {
        let callbacks = std::mem::take(&mut self.pending);
        debug!(connected, callbacks = callbacks.len(), "resolving connect callbacks");
        for callback in callbacks {
            callback(connected);
        }
    }
}

impl fmt::Debug for ConnectController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectController")
            .field("state", &self.state)
            .field("connect_timeout", &self.connect_timeout)
            .field("pending", &self.pending.len())
            .field("timer", &self.timer)
            .field("attempt", &self.attempt)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(2000);

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, impl Fn() -> Option<ConnectCallback>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move || {
            let sink = sink.clone();
            Some(Box::new(move |ok: bool| sink.lock().unwrap().push(ok)) as ConnectCallback)
        };
        (log, make)
    }

    #[test]
    fn connect_lifecycle() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);

        assert_eq!(ctl.state(), ConnectionState::Disconnected);

        let action = ctl.connect(t0, cb(), 3);
        assert_eq!(action, Some(ConnectAction::StartAttempt { attempt: 1, retries_remaining: 3 }));
        assert!(ctl.is_connecting());
        assert_eq!(ctl.next_deadline(), Some(t0 + TIMEOUT));

        assert!(ctl.on_connected());
        assert!(ctl.is_connected());
        assert_eq!(ctl.next_deadline(), None);
        assert_eq!(*log.lock().unwrap(), vec![true]);
    }

    #[test]
    fn connect_when_connected_resolves_immediately() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);
        ctl.connect(t0, None, 0);
        ctl.on_connected();

        assert_eq!(ctl.connect(t0, cb(), 3), None);
        assert_eq!(*log.lock().unwrap(), vec![true]);
        assert_eq!(ctl.attempts_started(), 1);
    }

    #[test]
    fn concurrent_connects_share_one_attempt() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);

        assert!(ctl.connect(t0, cb(), 3).is_some());
        assert!(ctl.connect(t0, cb(), 3).is_none());
        assert!(ctl.connect(t0, cb(), 3).is_none());
        assert_eq!(ctl.pending_callbacks(), 3);

        ctl.on_connected();
        assert_eq!(*log.lock().unwrap(), vec![true, true, true]);
        assert_eq!(ctl.pending_callbacks(), 0);
    }

    #[test]
    fn timeout_retries_then_gives_up() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);
        ctl.connect(t0, cb(), 2);

        assert_eq!(ctl.poll_timeout(t0 + TIMEOUT - Duration::from_millis(1)), None);

        let action = ctl.poll_timeout(t0 + TIMEOUT);
        assert_eq!(action, Some(ConnectAction::StartAttempt { attempt: 2, retries_remaining: 1 }));
        let action = ctl.poll_timeout(t0 + TIMEOUT * 2);
        assert_eq!(action, Some(ConnectAction::StartAttempt { attempt: 3, retries_remaining: 0 }));
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(ctl.poll_timeout(t0 + TIMEOUT * 3), Some(ConnectAction::CloseTransport));
        assert_eq!(ctl.state(), ConnectionState::Disconnected);
        assert_eq!(*log.lock().unwrap(), vec![false]);

        assert_eq!(ctl.poll_timeout(t0 + TIMEOUT * 10), None);
        assert_eq!(*log.lock().unwrap(), vec![false]);
    }

    #[test]
    fn transport_close_is_not_retried() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);
        ctl.connect(t0, cb(), 3);

        assert!(ctl.on_closed("refused"));
        assert_eq!(ctl.state(), ConnectionState::Disconnected);
        assert_eq!(*log.lock().unwrap(), vec![false]);
        assert_eq!(ctl.poll_timeout(t0 + TIMEOUT * 4), None);
        assert_eq!(ctl.attempts_started(), 1);
    }

    #[test]
    fn disconnect_while_connecting_resolves_once() {
        let t0 = Instant::now();
        let (log, cb) = recorder();
        let mut ctl = ConnectController::new(TIMEOUT);
        ctl.connect(t0, cb(), 3);
        ctl.connect(t0, cb(), 3);

        assert_eq!(ctl.disconnect(), Some(ConnectAction::CloseTransport));
        assert!(!ctl.is_connected());
        assert!(!ctl.is_connecting());
        assert_eq!(*log.lock().unwrap(), vec![false, false]);

        // Stale signals after an early resolution change nothing.
        assert!(!ctl.on_connected());
        assert!(!ctl.on_closed("late"));
        assert_eq!(ctl.poll_timeout(t0 + TIMEOUT), None);
        assert_eq!(*log.lock().unwrap(), vec![false, false]);
    }

    #[test]
    fn disconnect_when_disconnected_is_noop() {
        let mut ctl = ConnectController::new(TIMEOUT);
        assert_eq!(ctl.disconnect(), None);
    }

    #[test]
    fn callbacks_run_in_enqueue_order() {
        let t0 = Instant::now();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut ctl = ConnectController::new(TIMEOUT);
        for i in 0..4 {
            let order = order.clone();
            ctl.connect(t0, Some(Box::new(move |_: bool| order.lock().unwrap().push(i))), 0);
        }
        ctl.on_connected();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }
}
