//! Retry policy implementation
//!
//! Retry policy for fallible async operations.
//!
//! Semantics:
//! - `max_attempts` counts total attempts (initial try + retries).
//! - `should_retry` predicate decides whether a failure is retryable.
//! - Backoff calculates the delay per retry attempt; jitter perturbs the
//!   starting delay once per execution to avoid thundering herds.
//! - The observer is notified with `(attempt, delay)` before each wait; its
//!   panics are caught and logged, never propagated.
//! - Sleeper controls how delays are applied (production uses `TokioSleeper`;
//!   tests can inject `InstantSleeper`/`RecordingSleeper`).
//! - The last failure is surfaced unchanged when attempts run out or the
//!   predicate declines: callers get the operation's own error value, not an
//!   aggregate wrapper.
//!
//! Invariants:
//! - Attempts never exceed `max_attempts`.
//! - Backoff/observer/sleeper are each invoked exactly attempts-1 times on an
//!   operation that never succeeds and is always retryable.
//! - A policy is immutable once built and safe to share across concurrent
//!   executions.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use patience::{Backoff, Jitter, RetryPolicy};
//!
//! #[derive(Debug)]
//! struct MyErr;
//! impl std::fmt::Display for MyErr { fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "oops") } }
//! impl std::error::Error for MyErr {}
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let policy = RetryPolicy::<MyErr>::builder()
//!     .max_attempts(3) // total attempts
//!     .backoff(Backoff::new(Duration::from_millis(100), 2.0))
//!     .with_jitter(Jitter::proportional())
//!     .should_retry(|_e| true)
//!     .build()
//!     .unwrap();
//! let result: Result<(), _> = policy.execute(|| async { Err(MyErr) }).await;
//! assert!(result.is_err());
//! # });
//! ```

use crate::{Backoff, Jitter, NoopObserver, RetryError, RetryObserver, Sleeper, TokioSleeper};
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_layer::Layer;
use tower_service::Service;

/// Retry policy combining backoff, jitter, predicate, observer, and sleeper.
pub struct RetryPolicy<E> {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    on_retry: Arc<dyn RetryObserver>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff.clone(),
            jitter: self.jitter,
            should_retry: Arc::clone(&self.should_retry),
            on_retry: Arc::clone(&self.on_retry),
            sleeper: Arc::clone(&self.sleeper),
        }
    }
}

impl<E> std::fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("should_retry", &"<predicate>")
            .field("on_retry", &"<observer>")
            .field("sleeper", &"<sleeper>")
            .finish()
    }
}

impl<E> RetryPolicy<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Construct a new builder with defaults.
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    /// Return a copy of this policy whose starting delay is perturbed by
    /// `jitter`, redrawn once per execution. All other fields pass through
    /// unchanged.
    pub fn with_jitter(self, jitter: Jitter) -> Self {
        Self { jitter, ..self }
    }

    /// Execute an async operation with retry semantics.
    ///
    /// Returns the first success, or the last observed failure once attempts
    /// run out or `should_retry` declines.
    pub async fn execute<T, Fut, Op>(&self, operation: Op) -> Result<T, RetryError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, None).await
    }

    /// Execute with a cancellation signal. Triggering the token during a wait
    /// stops the loop immediately with `RetryError::Cancelled`; behavior is
    /// otherwise identical to [`execute`](Self::execute).
    pub async fn execute_cancellable<T, Fut, Op>(
        &self,
        operation: Op,
        cancel: CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        self.run(operation, Some(cancel)).await
    }

    async fn run<T, Fut, Op>(
        &self,
        mut operation: Op,
        cancel: Option<CancellationToken>,
    ) -> Result<T, RetryError<E>>
    where
        T: Send,
        Fut: Future<Output = Result<T, E>> + Send,
        Op: FnMut() -> Fut + Send,
    {
        // One jitter draw per execution; growth applies on top of it.
        let backoff = match self.jitter {
            Jitter::None => self.backoff.clone(),
            jitter => {
                let starting = jitter.apply(self.backoff.starting_delay());
                self.backoff.clone().starting_at(starting)
            }
        };

        for attempt in 1..=self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(failure) => {
                    // Last attempt and predicate rejection both surface the
                    // failure as-is, with no wait.
                    if attempt == self.max_attempts || !(self.should_retry)(&failure) {
                        return Err(RetryError::Inner(failure));
                    }

                    let delay = backoff.delay_for(attempt);
                    self.notify_observer(attempt, delay);

                    match &cancel {
                        Some(token) => {
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => return Err(RetryError::Cancelled),
                                _ = self.sleeper.sleep(delay) => {}
                            }
                        }
                        None => self.sleeper.sleep(delay).await,
                    }
                }
            }
        }

        // Safety: unreachable because the loop runs max_attempts times and the
        // last iteration always returns.
        debug_assert!(false, "Retry loop should have returned; this indicates a logic bug");
        unreachable!()
    }

    fn notify_observer(&self, attempt: usize, delay: Duration) {
        let observer = Arc::clone(&self.on_retry);
        let outcome = catch_unwind(AssertUnwindSafe(move || observer.on_retry(attempt, delay)));
        if outcome.is_err() {
            tracing::warn!(attempt, "retry observer panicked; notification dropped");
        }
    }

    /// Wrap this policy in a tower layer.
    pub fn into_layer(self) -> RetryLayer<E> {
        RetryLayer { policy: self }
    }
}

/// Builder for `RetryPolicy`.
pub struct RetryPolicyBuilder<E> {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
    on_retry: Arc<dyn RetryObserver>,
    sleeper: Arc<dyn Sleeper>,
}

/// Errors produced while building a retry policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// `max_attempts` must be > 0.
    #[error("max_attempts must be > 0 (got {0})")]
    InvalidMaxAttempts(usize),
    /// `time_multiple` must be finite and >= 1 for genuine backoff.
    #[error("time_multiple must be finite and >= 1 (got {0})")]
    InvalidTimeMultiple(f64),
}

impl<E> RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Create a builder with sane defaults: 3 total attempts, 1s starting
    /// delay doubling per retry, 30s delay cap, no jitter, retry everything,
    /// no-op observer.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::new(Duration::from_secs(1), 2.0)
                .with_max(Duration::from_secs(30)),
            jitter: Jitter::None,
            should_retry: Arc::new(|_| true),
            on_retry: Arc::new(NoopObserver),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set total attempts (initial + retries). Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff schedule.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the jitter strategy.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Predicate to decide if a failure is retryable.
    pub fn should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Observer notified with `(attempt, delay)` before each wait.
    pub fn on_retry<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver + 'static,
    {
        self.on_retry = Arc::new(observer);
        self
    }

    /// Closure form of [`on_retry`](Self::on_retry).
    pub fn on_retry_fn<F>(self, hook: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.on_retry(crate::observer::FnObserver(hook))
    }

    /// Provide a custom sleeper implementation.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retry policy, validating inputs.
    pub fn build(self) -> Result<RetryPolicy<E>, BuildError> {
        if self.max_attempts == 0 {
            return Err(BuildError::InvalidMaxAttempts(0));
        }
        let time_multiple = self.backoff.time_multiple();
        if !time_multiple.is_finite() || time_multiple < 1.0 {
            return Err(BuildError::InvalidTimeMultiple(time_multiple));
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter: self.jitter,
            should_retry: self.should_retry,
            on_retry: self.on_retry,
            sleeper: self.sleeper,
        })
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Tower-native retry layer wrapping services in a [`RetryPolicy`].
pub struct RetryLayer<E> {
    policy: RetryPolicy<E>,
}

impl<E> RetryLayer<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn new(policy: RetryPolicy<E>) -> Self {
        Self { policy }
    }
}

impl<E> Clone for RetryLayer<E> {
    fn clone(&self) -> Self {
        Self { policy: self.policy.clone() }
    }
}

/// Retry service produced by `RetryLayer`.
pub struct RetryService<S, E> {
    inner: S,
    policy: RetryPolicy<E>,
}

impl<S: Clone, E> Clone for RetryService<S, E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), policy: self.policy.clone() }
    }
}

impl<S, E, Request> Service<Request> for RetryService<S, E>
where
    Request: Clone + Send + 'static,
    S: Service<Request> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Into<E> + Send + 'static,
    S::Future: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = RetryError<E>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(|e| RetryError::Inner(e.into()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            policy
                .execute(move || {
                    let mut service = inner.clone();
                    let req = req.clone();
                    async move { service.call(req).await.map_err(Into::into) }
                })
                .await
        })
    }
}

impl<S, E> Layer<S> for RetryLayer<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    type Service = RetryService<S, E>;
    fn layer(&self, service: S) -> Self::Service {
        RetryService { inner: service, policy: self.policy.clone() }
    }
}
