#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Patience 🐢
//!
//! Retry policies for fallible async operations: exponential backoff,
//! proportional jitter, bounded attempts, retry predicates, cancellation,
//! and pluggable observers.
//!
//! ## Features
//!
//! - **Retry policies** with a geometric backoff schedule and optional delay cap
//! - **Proportional jitter** (±15% of the starting delay, drawn once per execution)
//! - **Retry predicates** deciding per failure whether another attempt is warranted
//! - **Observers** notified with `(attempt, delay)` before each wait
//! - **Cancellation** via `CancellationToken` for aborting in-flight waits
//! - **Tower integration** through `RetryLayer`
//! - **Deterministic tests** via injectable sleepers; no real time needed
//!
//! ## Quick Start
//!
//! ```rust
//! use patience::{Backoff, Jitter, RetryPolicy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let policy = RetryPolicy::builder()
//!         .max_attempts(3)
//!         .backoff(Backoff::new(Duration::from_secs(1), 2.0).with_max(Duration::from_secs(30)))
//!         .with_jitter(Jitter::proportional())
//!         .build()
//!         .expect("valid policy");
//!
//!     let result = policy.execute(|| async {
//!         // Your async operation here
//!         Ok::<_, std::io::Error>(())
//!     }).await;
//!     assert!(result.is_ok());
//! }
//! ```
//!
//! The failure a caller receives is the operation's own last error, surfaced
//! unchanged — distinguishing "gave up" from "single failure" is attempt-count
//! bookkeeping the caller can do through an observer if needed.

pub mod backoff;
pub mod error;
pub mod jitter;
pub mod observer;
pub mod prelude;
pub mod retry;
pub mod sleeper;

// Re-exports
pub use backoff::{Backoff, MAX_BACKOFF};
pub use error::RetryError;
pub use jitter::{Jitter, PROPORTIONAL_SPREAD};
pub use observer::{FnObserver, LogObserver, MemoryObserver, NoopObserver, RetryObserver};
pub use retry::{BuildError, RetryLayer, RetryPolicy, RetryPolicyBuilder, RetryService};
pub use sleeper::{InstantSleeper, RecordingSleeper, Sleeper, TokioSleeper};

// Cancellation signal accepted by `RetryPolicy::execute_cancellable`.
pub use tokio_util::sync::CancellationToken;
