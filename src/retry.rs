use std::{fmt, future::Future, sync::Arc};

use crate::{delay, AbortSignal, Delay, Error};

/// Predicate deciding whether a failure should be retried.
///
/// Receives the error and the attempt counter *after* it was incremented,
/// so `1` after the first failure.
pub type RetryPredicate<E> = Arc<dyn Fn(&E, u32) -> bool + Send + Sync>;

/// Controls the retry loop.
pub struct RetryOptions<E = Error> {
    /// Total tries, not retries. Must be at least 1.
    pub attempts: u32,
    pub delay: Delay,
    pub signal: Option<AbortSignal>,
    /// `None` retries every error.
    pub retryable: Option<RetryPredicate<E>>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Delay::default(),
            signal: None,
            retryable: None,
        }
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            attempts: self.attempts,
            delay: self.delay.clone(),
            signal: self.signal.clone(),
            retryable: self.retryable.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .field("signal", &self.signal)
            .field("retryable", &self.retryable.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<E> RetryOptions<E> {
    /// Three attempts with the default backoff, no signal, every error retried.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total number of tries.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Sets the wait between attempts.
    pub fn delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    /// Cancels the loop when `signal` fires.
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Only retries failures for which `predicate` returns `true`.
    pub fn retryable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E, u32) -> bool + Send + Sync + 'static,
    {
        self.retryable = Some(Arc::new(predicate));
        self
    }

    /// Rejects configurations the loop cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.attempts < 1 {
            return Err(Error::Config(format!(
                "attempts must be at least 1, got {}",
                self.attempts
            )));
        }
        Ok(())
    }

    fn is_retryable(&self, err: &E, attempt: u32) -> bool {
        self.retryable
            .as_ref()
            .map_or(true, |predicate| predicate(err, attempt))
    }
}

/// Runs `operation` until it succeeds, the predicate declines, attempts run
/// out, or the signal fires.
///
/// Attempts are strictly sequential. The operation's own error is returned
/// unmodified; configuration and cancellation failures are converted through
/// `E: From<Error>`. Once a failure is observed with the signal already fired,
/// the cancellation reason wins over the operation's error.
pub async fn retry<T, E, F, Fut>(mut operation: F, options: &RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    options.validate()?;

    let mut attempt = 0u32;
    let mut last_error = None;

    while attempt < options.attempts {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if let Some(reason) = options.signal.as_ref().and_then(AbortSignal::reason) {
            return Err(Error::Aborted(reason).into());
        }

        attempt += 1;
        if attempt >= options.attempts || !options.is_retryable(&err, attempt) {
            return Err(err);
        }

        let wait_for = options.delay.for_attempt(attempt);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "attempt {} of {} failed, retrying after {} ms",
            attempt,
            options.attempts,
            wait_for.as_millis()
        );

        delay::wait(wait_for, options.signal.as_ref())
            .await
            .map_err(Error::Aborted)?;
        last_error = Some(err);
    }

    match last_error {
        Some(err) => Err(err),
        None => Err(Error::Config("retry loop ended without an attempt".to_owned()).into()),
    }
}
