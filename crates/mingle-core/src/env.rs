//! Environment abstraction.
//!
//! The chat core never reads the clock itself. Drivers obtain `now` from an
//! [`Environment`] and pass it into the state machines, which lets the test
//! harness substitute a virtual clock and replay timeouts exactly.

use std::{future::Future, time::Duration, time::Instant};

/// Source of time for drivers.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock environment backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        // Read through tokio so a paused test clock stays coherent with sleeps.
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
