//! Typing-state debouncer.
//!
//! Keystrokes arrive far more often than the remote party needs to hear
//! about them. The debouncer announces "writing" once per burst of activity
//! and schedules "stopped writing" for when the user goes idle.
//!
//! Invariant: while `announced` is true the idle timer is armed, so a stop
//! signal is always eventually produced.

use std::time::{Duration, Instant};

use crate::{room::RoomId, timer::TimerSlot};

/// A typing-state change to send for a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritingSignal {
    /// Room the signal applies to.
    pub room_id: RoomId,
    /// `true` for started, `false` for stopped.
    pub writing: bool,
}

impl WritingSignal {
    fn started(room_id: RoomId) -> Self {
        Self { room_id, writing: true }
    }

    fn stopped(room_id: RoomId) -> Self {
        Self { room_id, writing: false }
    }
}

/// Per-connection typing state.
#[derive(Debug)]
pub struct WritingDebouncer {
    idle: Duration,
    announced: bool,
    last_room: Option<RoomId>,
    timer: TimerSlot,
}

impl WritingDebouncer {
    /// Debouncer that stops after `idle` without activity.
    pub fn new(idle: Duration) -> Self {
        Self { idle, announced: false, last_room: None, timer: TimerSlot::new() }
    }

    /// Whether "writing" is currently announced.
    pub fn is_announced(&self) -> bool {
        self.announced
    }

    /// Room of the current or most recent announcement.
    pub fn last_room(&self) -> Option<&str> {
        self.last_room.as_deref()
    }

    /// When the pending stop signal is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Record activity in `room_id`.
    ///
    /// Returns the signals to send now: a start when not yet announced, and a
    /// stop for the previous room first when activity moved to another room.
    pub fn set_writing(&mut self, now: Instant, room_id: &str) -> Vec<WritingSignal> {
        let mut signals = Vec::new();

        if self.announced && self.last_room.as_deref() != Some(room_id) {
            if let Some(previous) = self.last_room.take() {
                signals.push(WritingSignal::stopped(previous));
            }
            self.announced = false;
        }

        self.timer.arm(now, self.idle);
        self.last_room = Some(room_id.to_string());

        if !self.announced {
            self.announced = true;
            signals.push(WritingSignal::started(room_id.to_string()));
        }

        signals
    }

    /// Produce the stop signal if the idle timer is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<WritingSignal> {
        self.timer.expire(now)?;
        self.stop()
    }

    /// Clear the session, returning the stop signal owed for an active
    /// announcement.
    pub fn reset(&mut self) -> Option<WritingSignal> {
        self.timer.cancel();
        self.stop()
    }

    fn stop(&mut self) -> Option<WritingSignal> {
        if !self.announced {
            return None;
        }
        self.announced = false;
        self.last_room.clone().map(WritingSignal::stopped)
    }
}
