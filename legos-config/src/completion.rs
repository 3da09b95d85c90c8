//! Two-state completion signal between the dispatcher and a waiting call

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Logical state of a [`Completion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Waiting for a result
    Armed,
    /// A result has been published and not yet consumed
    Published,
}

/// How a bounded wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
    /// The session's cancellation token fired while waiting
    Interrupted,
}

/// Completion signal owned by a device session.
///
/// `publish` may run on any thread and never blocks. A publish that happens
/// before the waiter starts waiting is not lost: the flag stays set until the
/// next `arm`.
#[derive(Debug, Default)]
pub struct Completion {
    published: AtomicBool,
    notify: Notify,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to [`CompletionState::Armed`]
    pub fn arm(&self) {
        self.published.store(false, Ordering::SeqCst);
    }

    /// Mark a result as available and wake the waiter, if any
    pub fn publish(&self) {
        self.published.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn state(&self) -> CompletionState {
        if self.published.load(Ordering::SeqCst) {
            CompletionState::Published
        } else {
            CompletionState::Armed
        }
    }

    /// Wait until published (no bound)
    pub async fn wait(&self) {
        loop {
            // Register before checking the flag so a concurrent publish is not missed
            let notified = self.notify.notified();
            if self.published.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    /// Wait until published, the timeout elapses, or `cancel` fires
    pub async fn wait_for(&self, timeout: Duration, cancel: &CancellationToken) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = self.wait() => WaitOutcome::Signaled,
            _ = cancel.cancelled() => WaitOutcome::Interrupted,
            _ = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
        }
    }
}
