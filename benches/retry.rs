use criterion::{criterion_group, criterion_main, Criterion};
use patience::{Backoff, InstantSleeper, RetryPolicy};
use std::hint::black_box;
use std::time::Duration;

fn backoff_delay(c: &mut Criterion) {
    let backoff =
        Backoff::new(Duration::from_millis(100), 2.0).with_max(Duration::from_secs(30));
    c.bench_function("backoff_delay_for", |b| {
        b.iter(|| {
            for attempt in 0..16usize {
                black_box(backoff.delay_for(black_box(attempt)));
            }
        })
    });
}

fn execute_success_fast_path(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    let policy = RetryPolicy::builder()
        .with_sleeper(InstantSleeper)
        .build()
        .expect("valid retry policy");

    c.bench_function("execute_success", |b| {
        b.to_async(&rt).iter(|| async {
            policy
                .execute(|| async { Ok::<_, std::io::Error>(black_box(1u32)) })
                .await
                .expect("operation succeeds")
        })
    });
}

criterion_group!(benches, backoff_delay, execute_success_fast_path);
criterion_main!(benches);
