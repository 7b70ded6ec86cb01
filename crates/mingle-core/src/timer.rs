//! Cancellable deadline slots.
//!
//! A [`TimerSlot`] holds at most one pending deadline. Arming always cancels
//! the previous deadline first, and cancelling is a plain `take()`, so a
//! superseded deadline can never expire. Every armed deadline carries a fresh
//! token; callers that remember a token can tell a stale expiry from the
//! current one.

use std::time::{Duration, Instant};

/// A pending deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    token: u64,
    deadline: Instant,
}

impl TimerHandle {
    /// Token identifying this arming.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// When the timer expires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the deadline has been reached at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Slot holding zero or one pending deadline.
#[derive(Debug, Default)]
pub struct TimerSlot {
    current: Option<TimerHandle>,
    next_token: u64,
}

impl TimerSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending deadline with one expiring `after` from `now`.
    pub fn arm(&mut self, now: Instant, after: Duration) -> TimerHandle {
        self.cancel();
        self.next_token += 1;
        let handle = TimerHandle { token: self.next_token, deadline: now + after };
        self.current = Some(handle);
        handle
    }

    /// Clear the pending deadline, returning it if one was armed.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.current.take()
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.current.is_some()
    }

    /// Pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.current.map(|handle| handle.deadline)
    }

    /// Token of the pending deadline, if any.
    pub fn token(&self) -> Option<u64> {
        self.current.map(|handle| handle.token)
    }

    /// Take the pending deadline if it is due at `now`.
    ///
    /// The slot is empty afterwards, so each arming expires at most once.
    pub fn expire(&mut self, now: Instant) -> Option<TimerHandle> {
        match self.current {
            Some(handle) if handle.is_due(now) => self.current.take(),
            _ => None,
        }
    }
}
