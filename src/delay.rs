use std::{fmt, sync::Arc, time::Duration};

use rand::Rng;
use tokio::time::sleep;

use crate::{AbortReason, AbortSignal};

/// Lower bound (inclusive) of the default backoff jitter factor.
pub const JITTER_MIN: f64 = 0.85;
/// Upper bound (exclusive) of the default backoff jitter factor.
pub const JITTER_MAX: f64 = 1.15;

/// Suspends for `duration`, or fails early with the signal's reason.
///
/// An already-fired signal fails immediately without starting the timer.
/// Whichever side loses the race is dropped before returning, so neither the
/// timer nor the cancellation listener outlives the call.
pub async fn wait(duration: Duration, signal: Option<&AbortSignal>) -> Result<(), AbortReason> {
    let Some(signal) = signal else {
        sleep(duration).await;
        return Ok(());
    };

    if let Some(reason) = signal.reason() {
        return Err(reason);
    }

    tokio::select! {
        biased;
        reason = signal.aborted() => Err(reason),
        _ = sleep(duration) => Ok(()),
    }
}

/// Exponential backoff with multiplicative jitter: `base * 2^attempt * factor`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExponentialBackoff {
    pub base_ms: u64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self { base_ms: 200 }
    }
}

impl ExponentialBackoff {
    /// Delay for `attempt` with a freshly sampled jitter factor.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(JITTER_MIN..JITTER_MAX);
        self.delay_with_jitter(attempt, factor)
    }

    /// Delay for `attempt` with an explicit jitter factor.
    pub fn delay_with_jitter(&self, attempt: u32, factor: f64) -> Duration {
        let exp = attempt.min(16);
        let multiplier = 1u64 << exp;
        let raw_ms = self.base_ms.saturating_mul(multiplier) as f64 * factor;
        Duration::from_millis(raw_ms.max(0.0).round() as u64)
    }
}

/// How long to wait before the next attempt.
#[derive(Clone)]
pub enum Delay {
    /// Same delay before every retry.
    Fixed(Duration),
    /// Jittered exponential backoff.
    Exponential(ExponentialBackoff),
    /// Caller-supplied function of the attempt counter.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl Delay {
    /// Fixed delay of `ms` milliseconds.
    pub fn fixed_ms(ms: u64) -> Self {
        Self::Fixed(Duration::from_millis(ms))
    }

    /// Delay computed by `f` from the attempt counter.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluates the delay at the post-increment attempt counter.
    pub fn for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(duration) => *duration,
            Self::Exponential(backoff) => backoff.delay(attempt),
            Self::Custom(f) => f(attempt),
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::Exponential(ExponentialBackoff::default())
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(duration) => f.debug_tuple("Fixed").field(duration).finish(),
            Self::Exponential(backoff) => f.debug_tuple("Exponential").field(backoff).finish(),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}
