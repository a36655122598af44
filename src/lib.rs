//! `resilient-fetch` normalizes HTTP requests and responses and retries
//! asynchronous operations with backoff and cooperative cancellation.
//!
//! Entry points:
//! - [`Client::fetch_resource`] and the verb shortcuts ([`Client::get`], [`Client::post`], ...)
//! - [`Client::retry`] for URL, thunk, future or literal [`Target`]s
//! - [`retry()`] for any async operation with its own error type
//! - [`wait`] for a delay that an [`AbortSignal`] can cut short

mod abort;
mod client;
mod delay;
mod error;
mod options;
pub mod request;
pub mod response;
mod retry;
mod target;

pub use abort::{AbortController, AbortReason, AbortSignal};
pub use client::Client;
pub use delay::{wait, Delay, ExponentialBackoff, JITTER_MAX, JITTER_MIN};
pub use error::Error;
pub use options::{ClientOptions, FormData, FormValue, RequestBody, RequestOptions};
pub use response::Decoded;
pub use retry::{retry, RetryOptions, RetryPredicate};
pub use target::Target;

pub type Result<T> = std::result::Result<T, Error>;
