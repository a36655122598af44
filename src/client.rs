use std::{fmt, time::Duration};

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::{
    request::normalize_with_defaults,
    response::{classify, Decoded},
    retry::retry,
    ClientOptions, Error, RequestBody, RequestOptions, Result, RetryOptions, Target,
};

#[derive(Clone)]
/// HTTP client that normalizes requests, classifies responses and retries.
pub struct Client {
    http: reqwest::Client,
    options: ClientOptions,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client with a default `reqwest` client and default options.
    pub fn new() -> Self {
        Self::with_http_client(reqwest::Client::new())
    }

    /// Uses an existing `reqwest` client, e.g. one with custom TLS or proxy setup.
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            options: ClientOptions::default(),
        }
    }

    /// Creates a client configured from the environment.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    pub fn from_env() -> std::result::Result<Self, String> {
        Ok(Self::new().with_options(ClientOptions::from_env()?))
    }

    /// Applies client options such as timeout and default headers.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Returns the active client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends one request and returns the classified body.
    pub async fn send(&self, url: &str, options: &RequestOptions) -> Result<Decoded> {
        let request = normalize_with_defaults(url, options, &self.options.default_headers);
        let method = request.method.clone();

        #[cfg(feature = "tracing")]
        tracing::debug!("sending {} {}", method, url);

        let response = request
            .into_builder(&self.http, Duration::from_millis(self.options.timeout_ms))?
            .send()
            .await
            .map_err(Error::Transport)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("{} {} -> {}", method, url, response.status());

        classify(response, &method).await
    }

    /// Fetches `url` and deserializes the body into `T`.
    ///
    /// A no-content response deserializes as JSON `null`, so request
    /// `Option<_>` or `()` when the endpoint may return nothing.
    pub async fn fetch_resource<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        self.send(url, options).await?.deserialize()
    }

    /// Sends a `GET` request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        self.fetch_resource(url, &with_method(options, Method::GET, None))
            .await
    }

    /// Sends a `POST` request with `body`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<T> {
        self.fetch_resource(url, &with_method(options, Method::POST, Some(body.into())))
            .await
    }

    /// Sends a `PUT` request with `body`.
    pub async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<T> {
        self.fetch_resource(url, &with_method(options, Method::PUT, Some(body.into())))
            .await
    }

    /// Sends a `PATCH` request with `body`.
    pub async fn patch<T: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<RequestBody>,
        options: &RequestOptions,
    ) -> Result<T> {
        self.fetch_resource(url, &with_method(options, Method::PATCH, Some(body.into())))
            .await
    }

    /// Sends a `DELETE` request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        self.fetch_resource(url, &with_method(options, Method::DELETE, None))
            .await
    }

    /// Resolves `target`, retrying failures per `retry_options`.
    ///
    /// HTTP targets are normalized, sent and classified on every attempt with
    /// `request_options`. Literal and future targets resolve once.
    pub async fn retry<T: DeserializeOwned>(
        &self,
        target: Target<T>,
        retry_options: &RetryOptions,
        request_options: &RequestOptions,
    ) -> Result<T> {
        retry_options.validate()?;
        match target {
            Target::Thunk(mut thunk) => retry(|| thunk(), retry_options).await,
            Target::Http(url) => {
                retry(|| self.fetch_resource(&url, request_options), retry_options).await
            }
            Target::Future(future) => future.await,
            Target::Literal(value) => Ok(value),
        }
    }

    /// Resolves `target` once, without retrying.
    ///
    /// Exactly one side of the returned `Result` is populated; the target's
    /// failure becomes the `Err` value instead of being retried.
    pub async fn capture_result<T: DeserializeOwned>(
        &self,
        target: Target<T>,
        request_options: &RequestOptions,
    ) -> Result<T> {
        match target {
            Target::Thunk(mut thunk) => thunk().await,
            Target::Http(url) => self.fetch_resource(&url, request_options).await,
            Target::Future(future) => future.await,
            Target::Literal(value) => Ok(value),
        }
    }
}

fn with_method(
    options: &RequestOptions,
    method: Method,
    body: Option<RequestBody>,
) -> RequestOptions {
    let mut options = options.clone();
    options.method = method;
    if body.is_some() {
        options.body = body;
    }
    options
}
