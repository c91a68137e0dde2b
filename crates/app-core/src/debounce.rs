//! Trailing-edge debouncer with supersession
//!
//! Each [`Debouncer::schedule`] call cancels the previously scheduled action
//! (if it has not fired yet) and arms a new timer. Only the action from the
//! last call inside a quiet period runs.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Coalesces bursts of calls into a single delayed action
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with a fixed quiet period
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` once the quiet period elapses, superseding any earlier schedule
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Drop the scheduled action, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Whether an action is armed and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
