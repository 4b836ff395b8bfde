//! Jitter strategies to prevent thundering herd
//!
//! When to use which strategy:
//! - `None`: deterministic retries for tests or tightly controlled workflows.
//! - `Proportional`: scales the starting delay by a uniform factor in
//!   `[1 - spread, 1 + spread]` (default ±15%), so independent callers hitting
//!   the same dependency drift apart instead of retrying in lockstep.
//!
//! Notes:
//! - The factor is drawn once per policy execution, not once per attempt; the
//!   geometric growth then applies on top of the perturbed starting delay.
//! - RNG: uses `rand`'s thread-local RNG by default, which is safe for
//!   concurrent callers and does not correlate across tasks; deterministic
//!   RNGs can be injected via `apply_with_rng`.
//! - Precision: scaled durations saturate at `MAX_BACKOFF` to avoid panics on
//!   very large inputs.

use crate::backoff::MAX_BACKOFF;
use rand::{rng, Rng};
use std::time::Duration;

/// Default spread for proportional jitter (±15%).
pub const PROPORTIONAL_SPREAD: f64 = 0.15;

/// Spread configuration for proportional jitter; fields are private to
/// enforce validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionalConfig {
    spread: f64,
}

impl ProportionalConfig {
    /// Half-width of the scaling interval around 1.0.
    pub fn spread(&self) -> f64 {
        self.spread
    }
}

/// Jitter strategy for randomizing retry delays
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// No jitter - use exact backoff delays
    None,
    /// Scale the starting delay by a uniform factor around 1.0
    Proportional(ProportionalConfig),
}

impl Jitter {
    /// Create a proportional jitter strategy with the default ±15% spread.
    pub fn proportional() -> Self {
        Jitter::Proportional(ProportionalConfig { spread: PROPORTIONAL_SPREAD })
    }

    /// Create a proportional jitter strategy with a custom spread in `[0, 1]`.
    pub fn proportional_with(spread: f64) -> Result<Self, &'static str> {
        if !spread.is_finite() || !(0.0..=1.0).contains(&spread) {
            return Err("proportional jitter: spread must be within [0, 1]");
        }
        Ok(Jitter::Proportional(ProportionalConfig { spread }))
    }

    /// Apply jitter to a delay duration
    pub fn apply(&self, delay: Duration) -> Duration {
        let mut rng = rng();
        self.apply_with_rng(delay, &mut rng)
    }

    /// Apply jitter with a custom RNG (for testing)
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Proportional(config) => {
                let factor = rng.random_range(1.0 - config.spread..=1.0 + config.spread);
                scale(delay, factor)
            }
        }
    }
}

fn scale(delay: Duration, factor: f64) -> Duration {
    let secs = delay.as_secs_f64() * factor;
    if !secs.is_finite() {
        return MAX_BACKOFF;
    }
    Duration::from_secs_f64(secs.clamp(0.0, MAX_BACKOFF.as_secs_f64()))
}
