use std::{fmt, future::Future};

use futures_util::future::BoxFuture;

use crate::Result;

type Thunk<T> = Box<dyn FnMut() -> BoxFuture<'static, Result<T>> + Send>;

/// What a [`crate::Client`] call resolves.
pub enum Target<T> {
    /// Re-invoked on every attempt.
    Thunk(Thunk<T>),
    /// Awaited once; its outcome is final because a future cannot be re-run.
    Future(BoxFuture<'static, Result<T>>),
    /// Already resolved.
    Literal(T),
    /// URL fetched through the client on every attempt.
    Http(String),
}

impl<T> Target<T> {
    /// Wraps a closure producing a fresh future per attempt.
    pub fn thunk<F, Fut>(mut f: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::Thunk(Box::new(move || Box::pin(f())))
    }

    /// Wraps a single in-flight future.
    pub fn future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::Future(Box::pin(future))
    }

    /// Wraps an already known value.
    pub fn literal(value: T) -> Self {
        Self::Literal(value)
    }

    /// Targets a URL fetched with the call's request options.
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http(url.into())
    }
}

impl<T: fmt::Debug> fmt::Debug for Target<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thunk(_) => f.write_str("Thunk(<fn>)"),
            Self::Future(_) => f.write_str("Future(<pending>)"),
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Http(url) => f.debug_tuple("Http").field(url).finish(),
        }
    }
}
