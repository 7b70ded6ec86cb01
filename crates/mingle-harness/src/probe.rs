//! Connect-callback probe.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Hands out connect callbacks and records how each was resolved.
///
/// Callback `n` (in creation order) records `(n, connected)`, so tests can
/// check both resolution order and that nothing resolved twice.
#[derive(Debug, Clone, Default)]
pub struct CallbackProbe {
    results: Arc<Mutex<Vec<(usize, bool)>>>,
    issued: Arc<Mutex<usize>>,
}

impl CallbackProbe {
    /// Probe with no callbacks issued.
    pub fn new() -> Self {
        Self::default()
    }

    fn results_lock(&self) -> MutexGuard<'_, Vec<(usize, bool)>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A new callback.
    pub fn callback(&self) -> impl FnOnce(bool) + Send + 'static {
        let id = {
            let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
            *issued += 1;
            *issued - 1
        };
        let results = self.results.clone();
        move |connected: bool| {
            results.lock().unwrap_or_else(PoisonError::into_inner).push((id, connected));
        }
    }

    /// Resolutions so far, in invocation order.
    pub fn results(&self) -> Vec<(usize, bool)> {
        self.results_lock().clone()
    }

    /// Outcomes only, in invocation order.
    pub fn outcomes(&self) -> Vec<bool> {
        self.results_lock().iter().map(|(_, ok)| *ok).collect()
    }

    /// Callbacks issued so far.
    pub fn issued(&self) -> usize {
        *self.issued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether every issued callback resolved exactly once.
    pub fn all_resolved_once(&self) -> bool {
        let results = self.results_lock();
        let issued = self.issued();
        results.len() == issued && (0..issued).all(|id| results.iter().filter(|(r, _)| *r == id).count() == 1)
    }
}
