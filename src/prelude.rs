//! Convenient re-exports for common Patience types.
pub use crate::{
    backoff::{Backoff, MAX_BACKOFF},
    error::RetryError,
    jitter::Jitter,
    observer::{FnObserver, LogObserver, MemoryObserver, NoopObserver, RetryObserver},
    retry::{BuildError, RetryLayer, RetryPolicy, RetryPolicyBuilder},
    sleeper::{InstantSleeper, RecordingSleeper, Sleeper, TokioSleeper},
    CancellationToken,
};
