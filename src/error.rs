use crate::AbortReason;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code.
    ///
    /// `message` comes from the response body when it carries one,
    /// otherwise it is a generic message naming the status code.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Response body could not be decoded as declared.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// Invalid retry or client configuration. Never retried.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The cancellation signal fired; carries the caller's reason verbatim.
    #[error("{0}")]
    Aborted(AbortReason),
    /// Failure raised by a caller-supplied operation.
    #[error("{0}")]
    Operation(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error raised by a caller-supplied operation.
    pub fn operation(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Operation(err.into())
    }

    /// HTTP status code for [`Error::Http`], `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the failure came from a fired abort signal.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}
