use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use tokio_util::sync::CancellationToken;

const DEFAULT_REASON: &str = "This operation was aborted";

/// Caller-supplied cancellation reason, surfaced verbatim as [`crate::Error::Aborted`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbortReason(String);

impl AbortReason {
    /// Wraps a reason message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }

    /// Returns the reason message.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AbortReason {
    fn default() -> Self {
        Self(DEFAULT_REASON.to_owned())
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AbortReason {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AbortReason {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Read side of a cancellation handle. Every clone observes the same state.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<AbortReason>>,
}

impl AbortSignal {
    /// Returns `true` once the owning controller (or wrapped token) has fired.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation reason, or `None` while the signal is still live.
    pub fn reason(&self) -> Option<AbortReason> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(self.reason.get().cloned().unwrap_or_default())
    }

    /// Completes when the signal fires. Dropping the future detaches the listener.
    pub async fn aborted(&self) -> AbortReason {
        self.token.cancelled().await;
        self.reason.get().cloned().unwrap_or_default()
    }
}

impl From<CancellationToken> for AbortSignal {
    /// Observes an existing token; cancelling it yields the default reason.
    fn from(token: CancellationToken) -> Self {
        Self {
            token,
            reason: Arc::new(OnceLock::new()),
        }
    }
}

/// Write side of a cancellation handle.
#[derive(Clone, Debug, Default)]
pub struct AbortController {
    token: CancellationToken,
    reason: Arc<OnceLock<AbortReason>>,
}

impl AbortController {
    /// Creates a controller whose signal has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signal observing this controller.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
            reason: Arc::clone(&self.reason),
        }
    }

    /// Fires the signal. Only the first reason is kept; later calls are no-ops.
    pub fn abort(&self, reason: impl Into<AbortReason>) {
        // reason must be visible before any waiter wakes up
        let _ = self.reason.set(reason.into());
        self.token.cancel();

        #[cfg(feature = "tracing")]
        tracing::debug!("abort signal fired: {:?}", self.reason.get());
    }

    /// Returns `true` once [`AbortController::abort`] has been called.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}
