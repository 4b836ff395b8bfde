//! End-to-end behavior of the retry driver.

use patience::{
    Backoff, CancellationToken, LogObserver, MemoryObserver, RecordingSleeper, RetryError,
    RetryPolicy,
};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum UpstreamError {
    Transient(&'static str),
    Fatal(&'static str),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Transient(msg) => write!(f, "transient: {}", msg),
            UpstreamError::Fatal(msg) => write!(f, "fatal: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {}

fn flaky_policy(max_attempts: usize, sleeper: RecordingSleeper) -> RetryPolicy<UpstreamError> {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .backoff(Backoff::new(Duration::from_millis(100), 2.0).with_max(Duration::from_secs(1)))
        .should_retry(|e: &UpstreamError| matches!(e, UpstreamError::Transient(_)))
        .with_sleeper(sleeper)
        .build()
        .expect("valid retry policy")
}

#[tokio::test]
async fn doubling_schedule_end_to_end() {
    let sleeper = RecordingSleeper::new();
    let observer = MemoryObserver::new();
    let policy = RetryPolicy::builder()
        .max_attempts(4)
        .backoff(Backoff::new(Duration::from_millis(100), 2.0).with_max(Duration::from_secs(1)))
        .on_retry(observer.clone())
        .with_sleeper(sleeper.clone())
        .build()
        .expect("valid retry policy");

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let result = policy
        .execute(|| {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(UpstreamError::Transient("connection reset"))
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
        ]
    );
    assert_eq!(observer.count(), 3);
    assert_eq!(
        result.unwrap_err(),
        RetryError::Inner(UpstreamError::Transient("connection reset"))
    );
}

#[tokio::test]
async fn tight_cap_clamps_the_third_wait() {
    let sleeper = RecordingSleeper::new();
    let policy = RetryPolicy::builder()
        .max_attempts(4)
        .backoff(
            Backoff::new(Duration::from_millis(100), 2.0).with_max(Duration::from_millis(250)),
        )
        .with_sleeper(sleeper.clone())
        .build()
        .expect("valid retry policy");

    let _ = policy
        .execute(|| async { Err::<(), _>(UpstreamError::Transient("timeout")) })
        .await;

    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(250),
        ]
    );
}

#[tokio::test]
async fn predicate_distinguishes_transient_from_fatal() {
    let sleeper = RecordingSleeper::new();
    let policy = flaky_policy(5, sleeper.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let result = policy
        .execute(|| {
            let calls = calls_clone.clone();
            async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err::<(), _>(UpstreamError::Transient("upstream hiccup")),
                    _ => Err(UpstreamError::Fatal("schema mismatch")),
                }
            }
        })
        .await;

    // Two transient failures are retried, the fatal one stops the loop cold.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.count(), 2);
    assert_eq!(result.unwrap_err(), RetryError::Inner(UpstreamError::Fatal("schema mismatch")));
}

#[tokio::test]
async fn cancellation_mid_wait_stops_the_loop() {
    // Real tokio sleeper with a long first delay; the token fires well before
    // the wait elapses.
    let policy = RetryPolicy::builder()
        .max_attempts(5)
        .backoff(Backoff::new(Duration::from_secs(5), 2.0))
        .build()
        .expect("valid retry policy");

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let started = std::time::Instant::now();
    let result = policy
        .execute_cancellable(
            || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(UpstreamError::Transient("still down"))
                }
            },
            token,
        )
        .await;

    assert!(matches!(result, Err(RetryError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(5), "must not sit out the full wait");
}

#[tokio::test]
async fn one_policy_serves_concurrent_executions() {
    let policy = flaky_policy(3, RecordingSleeper::new());

    let make_op = || {
        let calls = Arc::new(AtomicUsize::new(0));
        move || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(UpstreamError::Transient("first call always fails"))
                } else {
                    Ok("recovered")
                }
            }
        }
    };

    let (left, right) = tokio::join!(policy.execute(make_op()), policy.execute(make_op()));
    assert_eq!(left.unwrap(), "recovered");
    assert_eq!(right.unwrap(), "recovered");
}

#[tokio::test]
async fn log_observer_emits_through_tracing() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let policy = RetryPolicy::builder()
        .max_attempts(2)
        .backoff(Backoff::new(Duration::from_millis(1), 2.0))
        .on_retry(LogObserver)
        .with_sleeper(RecordingSleeper::new())
        .build()
        .expect("valid retry policy");

    let result = policy
        .execute(|| async { Err::<(), _>(UpstreamError::Transient("logged")) })
        .await;

    assert!(matches!(result, Err(RetryError::Inner(_))));
}
