use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use serde::Serialize;

use crate::{Error, Result};

const TIMEOUT_ENV: &str = "RESILIENT_FETCH_TIMEOUT_MS";

/// Client-wide transport configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds, unless a request overrides it.
    pub timeout_ms: u64,
    /// Headers sent with every request. Request headers take precedence.
    pub default_headers: HeaderMap,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientOptions {
    /// Reads `RESILIENT_FETCH_TIMEOUT_MS`, falling back to defaults when unset.
    pub fn from_env() -> std::result::Result<Self, String> {
        let mut options = Self::default();
        match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => {
                options.timeout_ms = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("{TIMEOUT_ENV} must be an integer, got '{raw}'"))?;
            }
            Err(std::env::VarError::NotPresent) => {}
            Err(err) => return Err(format!("cannot read {TIMEOUT_ENV}: {err}")),
        }
        Ok(options)
    }
}

/// One field of a multipart form.
#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        bytes: Bytes,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

/// Multipart form payload.
///
/// Kept as plain data so the same form can be re-sent on every retry attempt;
/// it is turned into a `reqwest` form only when the request is dispatched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Appends a file part with an optional MIME type.
    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
        file_name: impl Into<String>,
        mime: Option<&str>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormValue::File {
                bytes: bytes.into(),
                file_name: Some(file_name.into()),
                mime: mime.map(str::to_owned),
            },
        ));
        self
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    pub(crate) fn into_form(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name, text),
                FormValue::File {
                    bytes,
                    file_name,
                    mime,
                } => {
                    let mut part = reqwest::multipart::Part::bytes(bytes.to_vec());
                    if let Some(file_name) = file_name {
                        part = part.file_name(file_name);
                    }
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime).map_err(Error::Transport)?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Request body as supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// JSON value. Objects and arrays are serialized with a JSON content type;
    /// scalars go out as plain text and `null` means no body.
    Json(serde_json::Value),
    /// Multipart form; the transport chooses the boundary.
    Form(FormData),
    /// Raw text sent unmodified.
    Text(String),
    /// Raw bytes sent unmodified.
    Bytes(Bytes),
}

impl RequestBody {
    /// Converts any serializable value into a [`RequestBody::Json`].
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| Error::Encode(format!("request body is not JSON-serializable: {err}")))
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<FormData> for RequestBody {
    fn from(value: FormData) -> Self {
        Self::Form(value)
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value.into())
    }
}

impl From<Bytes> for RequestBody {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

/// Per-request options.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    /// Overrides [`ClientOptions::timeout_ms`] for this request.
    pub timeout_ms: Option<u64>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            timeout_ms: None,
        }
    }
}

impl RequestOptions {
    /// Creates a `GET` request with no headers and no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing any value under the same (case-insensitive) name.
    ///
    /// Invalid names or values are rejected with [`Error::Config`].
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::try_from(name)
            .map_err(|err| Error::Config(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|err| Error::Config(format!("invalid value for header '{name}': {err}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = Some(RequestBody::json(value)?);
        Ok(self)
    }

    /// Overrides the client timeout for this request.
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{header::CONTENT_TYPE, Method};
    use serde_json::json;

    use super::{ClientOptions, RequestBody, RequestOptions};
    use crate::Error;

    #[test]
    fn defaults() {
        let client = ClientOptions::default();
        assert_eq!(client.timeout_ms, 30_000);
        assert!(client.default_headers.is_empty());

        let request = RequestOptions::default();
        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_none());
        assert!(request.timeout_ms.is_none());
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let options = RequestOptions::new()
            .header("Content-Type", "text/plain")
            .and_then(|o| o.header("content-type", "text/csv"))
            .expect("valid headers");
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.headers[CONTENT_TYPE], "text/csv");
    }

    #[test]
    fn invalid_header_is_config_error() {
        let err = RequestOptions::new()
            .header("bad header", "x")
            .expect_err("space is not allowed in header names");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn json_builder_serializes_value() {
        #[derive(serde::Serialize)]
        struct Payload {
            id: u32,
        }

        let options = RequestOptions::new()
            .json(&Payload { id: 7 })
            .expect("serializable");
        assert_eq!(options.body, Some(RequestBody::Json(json!({ "id": 7 }))));
    }

    #[test]
    fn from_env_reads_timeout() {
        // single test owns the variable so parallel tests cannot race on it
        std::env::remove_var(super::TIMEOUT_ENV);
        let options = ClientOptions::from_env().expect("unset falls back to defaults");
        assert_eq!(options, ClientOptions::default());

        std::env::set_var(super::TIMEOUT_ENV, " 2500 ");
        let options = ClientOptions::from_env().expect("valid integer");
        assert_eq!(options.timeout_ms, 2_500);

        std::env::set_var(super::TIMEOUT_ENV, "soon");
        let err = ClientOptions::from_env().expect_err("non-integer is rejected");
        assert!(err.contains("RESILIENT_FETCH_TIMEOUT_MS"), "{err}");
        assert!(err.contains("soon"), "{err}");

        std::env::remove_var(super::TIMEOUT_ENV);
    }
}
