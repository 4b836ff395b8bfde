//! Observers notified before each retry wait.
//!
//! The driver calls the configured observer with the failing attempt's index
//! (1-based) and the delay it is about to wait, right before sleeping. The
//! hook is side-effect only: panics inside an observer are caught by the
//! driver and logged, never surfaced as the operation's failure, so a
//! misbehaving observer cannot corrupt retry timing or outcome.
//!
//! The default observer is the explicit [`NoopObserver`]; nothing logs unless
//! the caller opts in by installing [`LogObserver`] or a custom hook. Closures
//! of shape `Fn(usize, Duration)` fit through [`FnObserver`] or the builder's
//! `on_retry_fn`:
//!
//! ```rust
//! use patience::RetryPolicy;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::builder()
//!     .on_retry_fn(|attempt: usize, delay: Duration| {
//!         eprintln!("attempt {} failed, waiting {:?}", attempt, delay);
//!     })
//!     .build()
//!     .unwrap();
//! let result = policy.execute(|| async { Ok::<_, std::io::Error>(()) }).await;
//! assert!(result.is_ok());
//! # });
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hook invoked with `(attempt, delay)` before each retry wait.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, attempt: usize, delay: Duration);
}

/// Adapter turning a `Fn(usize, Duration)` closure into an observer.
pub struct FnObserver<F>(pub F);

impl<F> RetryObserver for FnObserver<F>
where
    F: Fn(usize, Duration) + Send + Sync,
{
    fn on_retry(&self, attempt: usize, delay: Duration) {
        (self.0)(attempt, delay)
    }
}

/// Observer that ignores all notifications. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_retry(&self, _attempt: usize, _delay: Duration) {}
}

/// Observer that logs each notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RetryObserver for LogObserver {
    fn on_retry(&self, attempt: usize, delay: Duration) {
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "retrying after failure");
    }
}

/// Observer that stores notifications in memory, for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryObserver {
    notifications: Arc<Mutex<Vec<(usize, Duration)>>>,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(attempt, delay)` pairs observed so far, in order.
    pub fn notifications(&self) -> Vec<(usize, Duration)> {
        self.notifications.lock().unwrap().clone()
    }

    /// Number of notifications observed.
    pub fn count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

impl RetryObserver for MemoryObserver {
    fn on_retry(&self, attempt: usize, delay: Duration) {
        self.notifications.lock().unwrap().push((attempt, delay));
    }
}
