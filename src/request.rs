use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method,
};
use serde_json::Value;

use crate::{FormData, RequestBody, RequestOptions, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Body as it will be handed to the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum WireBody {
    Text(String),
    Bytes(Bytes),
    Multipart(FormData),
}

/// Fully normalized outgoing request.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<WireBody>,
    pub timeout: Option<Duration>,
}

/// Turns a URL plus [`RequestOptions`] into the exact method, headers and
/// body that go on the wire, without client defaults. Performs no I/O.
pub fn normalize(url: &str, options: &RequestOptions) -> TransportRequest {
    normalize_with_defaults(url, options, &HeaderMap::new())
}

/// Normalizes a request, merging `defaults` under the caller's headers.
pub(crate) fn normalize_with_defaults(
    url: &str,
    options: &RequestOptions,
    defaults: &HeaderMap,
) -> TransportRequest {
    let mut headers = merge_headers(defaults, &options.headers);

    let body = match &options.body {
        None | Some(RequestBody::Json(Value::Null)) => None,
        Some(RequestBody::Form(form)) => {
            headers.remove(CONTENT_TYPE);
            Some(WireBody::Multipart(form.clone()))
        }
        Some(RequestBody::Json(value @ (Value::Object(_) | Value::Array(_)))) => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            }
            Some(WireBody::Text(value.to_string()))
        }
        // scalars are not structured values: sent as plain text, no content-type
        Some(RequestBody::Json(Value::String(text))) => Some(WireBody::Text(text.clone())),
        Some(RequestBody::Json(scalar)) => Some(WireBody::Text(scalar.to_string())),
        Some(RequestBody::Text(text)) => Some(WireBody::Text(text.clone())),
        Some(RequestBody::Bytes(bytes)) => Some(WireBody::Bytes(bytes.clone())),
    };

    TransportRequest {
        method: options.method.clone(),
        url: url.to_owned(),
        headers,
        body,
        timeout: options.timeout_ms.map(Duration::from_millis),
    }
}

fn merge_headers(defaults: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

impl TransportRequest {
    pub(crate) fn into_builder(
        self,
        http: &reqwest::Client,
        default_timeout: Duration,
    ) -> Result<reqwest::RequestBuilder> {
        let builder = http
            .request(self.method, &self.url)
            .headers(self.headers)
            .timeout(self.timeout.unwrap_or(default_timeout));

        let builder = match self.body {
            None => builder,
            Some(WireBody::Text(text)) => builder.body(text),
            Some(WireBody::Bytes(bytes)) => builder.body(bytes),
            Some(WireBody::Multipart(form)) => builder.multipart(form.into_form()?),
        };
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{
        header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
        Method,
    };
    use serde_json::json;

    use super::{normalize, normalize_with_defaults, WireBody};
    use crate::{FormData, RequestBody, RequestOptions};

    fn with_header(options: RequestOptions, name: &str, value: &str) -> RequestOptions {
        options.header(name, value).expect("valid header")
    }

    #[test]
    fn defaults_to_get_without_body() {
        let request = normalize("https://example.test/a", &RequestOptions::default());
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://example.test/a");
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert!(request.timeout.is_none());
    }

    #[test]
    fn structured_body_is_serialized_with_json_content_type() {
        let options = RequestOptions::new()
            .method(Method::POST)
            .body(json!({ "name": "Kit", "tags": [1, 2] }));
        let request = normalize("https://example.test", &options);

        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        let Some(WireBody::Text(text)) = request.body else {
            panic!("expected text body");
        };
        let round: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
        assert_eq!(round, json!({ "name": "Kit", "tags": [1, 2] }));
    }

    #[test]
    fn sequence_body_is_serialized() {
        let options = RequestOptions::new().body(json!([1, "two"]));
        let request = normalize("https://example.test", &options);
        assert_eq!(request.body, Some(WireBody::Text("[1,\"two\"]".to_owned())));
    }

    #[test]
    fn scalar_json_bodies_are_sent_as_plain_text() {
        let string = normalize(
            "https://example.test",
            &RequestOptions::new().body(json!("hello")),
        );
        assert_eq!(string.body, Some(WireBody::Text("hello".to_owned())));
        assert!(!string.headers.contains_key(CONTENT_TYPE));

        let number = normalize(
            "https://example.test",
            &RequestOptions::new().json(&42).expect("serializable"),
        );
        assert_eq!(number.body, Some(WireBody::Text("42".to_owned())));
        assert!(!number.headers.contains_key(CONTENT_TYPE));

        let flag = normalize("https://example.test", &RequestOptions::new().body(json!(true)));
        assert_eq!(flag.body, Some(WireBody::Text("true".to_owned())));
        assert!(!flag.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn caller_content_type_is_kept_for_structured_body() {
        let options = with_header(
            RequestOptions::new().body(json!({ "a": 1 })),
            "CONTENT-TYPE",
            "application/vnd.api+json",
        );
        let request = normalize("https://example.test", &options);
        assert_eq!(request.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(request.headers[CONTENT_TYPE], "application/vnd.api+json");
    }

    #[test]
    fn multipart_body_strips_content_type() {
        let form = FormData::new().text("field", "value");
        let options = with_header(
            RequestOptions::new().method(Method::POST).body(form.clone()),
            "Content-Type",
            "multipart/form-data",
        );
        let request = normalize("https://example.test", &options);
        assert!(!request.headers.contains_key(CONTENT_TYPE));
        assert_eq!(request.body, Some(WireBody::Multipart(form)));
    }

    #[test]
    fn raw_bodies_pass_through_untouched() {
        let text = normalize(
            "https://example.test",
            &RequestOptions::new().body("plain words"),
        );
        assert_eq!(text.body, Some(WireBody::Text("plain words".to_owned())));
        assert!(!text.headers.contains_key(CONTENT_TYPE));

        let bytes = normalize(
            "https://example.test",
            &RequestOptions::new().body(vec![0u8, 159, 146, 150]),
        );
        assert_eq!(
            bytes.body,
            Some(WireBody::Bytes(vec![0u8, 159, 146, 150].into()))
        );
    }

    #[test]
    fn json_null_means_no_body() {
        let options = RequestOptions::new().body(RequestBody::Json(serde_json::Value::Null));
        let request = normalize("https://example.test", &options);
        assert!(request.body.is_none());
        assert!(!request.headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn caller_headers_override_defaults() {
        let mut defaults = HeaderMap::new();
        defaults.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        defaults.insert("x-client", HeaderValue::from_static("resilient-fetch"));

        let options = with_header(RequestOptions::new(), "Accept", "application/json");
        let request = normalize_with_defaults("https://example.test", &options, &defaults);

        assert_eq!(request.headers[ACCEPT], "application/json");
        assert_eq!(request.headers.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(request.headers["x-client"], "resilient-fetch");
    }

    #[test]
    fn default_content_type_counts_as_caller_supplied() {
        let mut defaults = HeaderMap::new();
        defaults.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));

        let options = RequestOptions::new().body(json!({ "a": 1 }));
        let request = normalize_with_defaults("https://example.test", &options, &defaults);
        assert_eq!(request.headers[CONTENT_TYPE], "text/csv");
    }

    #[test]
    fn request_timeout_is_carried() {
        let request = normalize("https://example.test", &RequestOptions::new().timeout_ms(250));
        assert_eq!(request.timeout, Some(std::time::Duration::from_millis(250)));
    }
}
