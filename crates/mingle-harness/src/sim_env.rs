//! Virtual clock.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use mingle_core::Environment;

/// Environment whose clock only moves when told to.
///
/// Clones share the same clock. `sleep` advances virtual time and completes
/// immediately.
#[derive(Debug, Clone)]
pub struct SimEnv {
    start: Instant,
    now: Arc<Mutex<Instant>>,
}

impl SimEnv {
    /// Clock starting at the current wall-clock instant.
    pub fn new() -> Self {
        let start = Instant::now();
        Self { start, now: Arc::new(Mutex::new(start)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Move the clock to `at`. Earlier instants are ignored.
    pub fn advance_to(&self, at: Instant) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if at > *now {
            *now = at;
        }
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        self.now() - self.start
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}
