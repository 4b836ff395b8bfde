//! Backoff schedule for retry policies.
//!
//! A schedule is a geometric progression: the wait before attempt `a + 1` is
//! `starting_delay * time_multiple^(a - 1)`, optionally clamped by `max_delay`.
//! Attempt semantics: attempt index `0` represents the initial call (no delay),
//! and retries start at `attempt = 1`. Delays saturate at a documented maximum
//! to avoid overflow.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use patience::Backoff;
//!
//! let backoff = Backoff::new(Duration::from_millis(100), 2.0)
//!     .with_max(Duration::from_secs(2));
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(0)); // initial call
//! assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
//! assert_eq!(backoff.delay_for(6), Duration::from_secs(2)); // capped
//! ```
//!
//! Overflow behavior: delays are computed in `f64` seconds; results that are
//! non-finite or exceed `MAX_BACKOFF` (1 day) saturate to `MAX_BACKOFF` before
//! any use of the value.

use std::time::Duration;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Geometric backoff schedule: starting delay, growth factor, optional cap.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    starting_delay: Duration,
    time_multiple: f64,
    max_delay: Option<Duration>,
}

impl Backoff {
    /// Create a schedule growing by `time_multiple` per retry, uncapped.
    pub fn new(starting_delay: Duration, time_multiple: f64) -> Self {
        Self { starting_delay, time_multiple, max_delay: None }
    }

    /// Clamp every computed delay to `max`. A `max` below the starting delay
    /// flattens the schedule rather than erroring.
    pub fn with_max(mut self, max: Duration) -> Self {
        self.max_delay = Some(max);
        self
    }

    /// Replace the starting delay, keeping growth and cap. Used by jitter.
    pub fn starting_at(mut self, starting_delay: Duration) -> Self {
        self.starting_delay = starting_delay;
        self
    }

    /// The delay before the second attempt.
    pub fn starting_delay(&self) -> Duration {
        self.starting_delay
    }

    /// Per-retry growth factor.
    pub fn time_multiple(&self) -> f64 {
        self.time_multiple
    }

    /// Upper bound on computed delays, if set.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Calculate the delay for a given attempt number (0-based; 0 = initial
    /// call, no delay). `delay_for(a)` is the wait after failed attempt `a`,
    /// before attempt `a + 1`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let raw = self.starting_delay.as_secs_f64() * self.time_multiple.powi(exponent);
        let ceiling = self
            .max_delay
            .map_or(MAX_BACKOFF, |max| max.min(MAX_BACKOFF))
            .as_secs_f64();
        if !raw.is_finite() {
            return self.max_delay.map_or(MAX_BACKOFF, |max| max.min(MAX_BACKOFF));
        }
        Duration::from_secs_f64(raw.clamp(0.0, ceiling))
    }
}
