use reqwest::{
    header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Decoded success body.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// No content: HEAD, 204/205/304, `content-length: 0`, or an empty JSON body.
    Empty,
    Json(serde_json::Value),
    Text(String),
}

impl Decoded {
    /// Maps the body onto a JSON value: `Empty` becomes `null`, text a JSON string.
    pub fn into_value(self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => serde_json::Value::String(text),
        }
    }

    /// Deserializes the body into `T`. `Option<_>` and `()` accept [`Decoded::Empty`].
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_value())
            .map_err(|err| Error::Decode(format!("unexpected response shape: {err}")))
    }

    /// `true` for the no-content sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Classifies a completed response issued with `method`: success or
/// [`Error::Http`], and how the body is decoded.
///
/// The body is only read when the status or headers call for it.
pub async fn classify(response: reqwest::Response, method: &Method) -> Result<Decoded> {
    let status = response.status();

    if !status.is_success() {
        // a body that cannot be read still yields the generic message
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            message: error_message(status, &body),
        });
    }

    if is_no_content(method, status, response.headers()) {
        return Ok(Decoded::Empty);
    }

    let json = is_json(response.headers());
    let body = response.text().await.map_err(Error::Transport)?;
    decode_body(json, body)
}

/// Human-readable message for a failed response.
///
/// Uses the `message` field of a JSON object body, or a JSON string body.
/// Empty strings, `0`, `false` and `null` count as absent; anything else
/// falls back to a message naming the status code.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| match value {
            serde_json::Value::Object(mut map) => map.remove("message").and_then(scalar_text),
            value @ serde_json::Value::String(_) => scalar_text(value),
            _ => None,
        });

    extracted.unwrap_or_else(|| format!("request failed with status code {}", status.as_u16()))
}

fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        serde_json::Value::Number(number) if number.as_f64() != Some(0.0) => {
            Some(number.to_string())
        }
        serde_json::Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

/// `true` for HEAD requests, 204/205/304 statuses and `content-length: 0`.
pub fn is_no_content(method: &Method, status: StatusCode, headers: &HeaderMap) -> bool {
    if *method == Method::HEAD {
        return true;
    }
    if matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    ) {
        return true;
    }
    headers
        .get(CONTENT_LENGTH)
        .is_some_and(|value| value.as_bytes() == b"0")
}

/// `true` when the content type mentions `json`, case-insensitively.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Decodes a success body that has already been read as text.
pub fn decode_body(json: bool, body: String) -> Result<Decoded> {
    if !json {
        return Ok(Decoded::Text(body));
    }
    if body.trim().is_empty() {
        return Ok(Decoded::Empty);
    }
    serde_json::from_str(&body)
        .map(Decoded::Json)
        .map_err(|err| Error::Decode(format!("invalid JSON response: {err}")))
}
