//! Request construction for Watson operations.
//!
//! Every operation funnels through [`RequestBuilder`]: it merges header
//! layers, encodes query parameters, picks the body encoding from the
//! declared content type and produces an [`HttpRequest`] ready for the
//! executor. Credentials are not attached here.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::{WatsonError, WatsonResult};
use crate::transport::{HttpMethod, HttpRequest};

/// Content type sent with JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Content type sent with plain-text bodies when the caller names none.
pub const TEXT_PLAIN_UTF8: &str = "text/plain;charset=utf-8";

const CONTENT_TYPE: &str = "Content-Type";

/// Returns the analytics headers attached to every SDK request.
pub fn sdk_headers(service_name: &str, service_version: &str, operation_id: &str) -> Vec<(String, String)> {
    vec![
        (
            "User-Agent".to_string(),
            format!(
                "watson-apis-rust-sdk-{} {}",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
        ),
        (
            "X-IBMCloud-SDK-Analytics".to_string(),
            format!(
                "service_name={service_name};service_version={service_version};operation_id={operation_id}"
            ),
        ),
    ]
}

/// How a payload is turned into body bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Structured payloads are serialized as JSON.
    Json,
    /// The payload is sent as given.
    Raw,
}

impl ContentEncoding {
    /// Derives the encoding from a declared content type.
    ///
    /// `application/json` and any `+json` suffix type select [`Json`](Self::Json);
    /// everything else, including unparseable values, is [`Raw`](Self::Raw).
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.parse::<mime::Mime>() {
            Ok(m)
                if m.type_() == mime::APPLICATION
                    && (m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)) =>
            {
                ContentEncoding::Json
            }
            _ => ContentEncoding::Raw,
        }
    }
}

/// A request body before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A structured value.
    Json(Value),
    /// Text or markup, always sent verbatim.
    Text(String),
}

impl Payload {
    /// Serializes `value` into a structured payload.
    pub fn json<T: Serialize>(value: &T) -> WatsonResult<Self> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    /// Content type used when the caller declares none.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            Payload::Json(Value::String(_)) | Payload::Text(_) => TEXT_PLAIN_UTF8,
            Payload::Json(_) => APPLICATION_JSON,
        }
    }

    /// Encodes the payload.
    ///
    /// Text and JSON strings pass through byte-for-byte under either
    /// encoding. Every other [`Payload::Json`] value, whether object, array,
    /// number or bool, is written as compact JSON; `Raw` only changes how a
    /// string is treated.
    pub fn encode(&self, encoding: ContentEncoding) -> WatsonResult<Vec<u8>> {
        match (self, encoding) {
            (Payload::Text(text), _) | (Payload::Json(Value::String(text)), _) => {
                Ok(text.clone().into_bytes())
            }
            (Payload::Json(value), ContentEncoding::Json) => Ok(serde_json::to_vec(value)?),
            (Payload::Json(value), ContentEncoding::Raw) => Ok(value.to_string().into_bytes()),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Not set; the key is omitted.
    Absent,
    /// A single string.
    Str(String),
    /// A boolean, sent as `true` or `false`.
    Bool(bool),
    /// A list, sent comma-joined; omitted when empty.
    List(Vec<String>),
}

impl QueryValue {
    /// Renders the value for the query string, or `None` if it is omitted.
    pub fn encode(&self) -> Option<String> {
        match self {
            QueryValue::Absent => None,
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Bool(b) => Some(b.to_string()),
            QueryValue::List(items) if items.is_empty() => None,
            QueryValue::List(items) => Some(items.join(",")),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<&String> for QueryValue {
    fn from(s: &String) -> Self {
        QueryValue::Str(s.clone())
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(items: Vec<String>) -> Self {
        QueryValue::List(items)
    }
}

impl From<&[String]> for QueryValue {
    fn from(items: &[String]) -> Self {
        QueryValue::List(items.to_vec())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Absent, Into::into)
    }
}

/// Where a header came from. Later layers win on collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum HeaderLayer {
    Sdk,
    Client,
    Operation,
    Caller,
}

#[derive(Debug, Clone)]
enum Body {
    Payload {
        payload: Payload,
        content_type: Option<String>,
    },
    Wrapped(Value),
}

/// Builder for a single operation request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: HttpMethod,
    path: String,
    headers: Vec<(HeaderLayer, String, String)>,
    query: Vec<(String, QueryValue)>,
    body: Option<Body>,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Creates a builder for `method` and `path`.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Creates a POST builder.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Creates a GET builder.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Adds the SDK analytics headers and the default `Accept`.
    pub fn sdk_headers(mut self, service_name: &str, service_version: &str, operation_id: &str) -> Self {
        for (name, value) in sdk_headers(service_name, service_version, operation_id) {
            self.headers.push((HeaderLayer::Sdk, name, value));
        }
        self.headers
            .push((HeaderLayer::Sdk, "Accept".to_string(), APPLICATION_JSON.to_string()));
        self
    }

    /// Adds client-wide headers from the service configuration.
    pub fn client_headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        for (name, value) in headers {
            self.headers
                .push((HeaderLayer::Client, name.clone(), value.clone()));
        }
        self
    }

    /// Adds an operation header; `None` leaves it out.
    pub fn header<V: Into<String>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.headers
                .push((HeaderLayer::Operation, name.to_string(), value.into()));
        }
        self
    }

    /// Adds per-call headers supplied by the caller. These win over every
    /// other layer.
    pub fn custom_headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (name, value) in headers {
            self.headers
                .push((HeaderLayer::Caller, name.clone(), value.clone()));
        }
        self
    }

    /// Adds a query parameter; absent values are dropped at build time.
    pub fn query(mut self, name: &str, value: impl Into<QueryValue>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    /// Sets the body and its declared content type.
    pub fn payload(mut self, payload: Payload, content_type: Option<&str>) -> Self {
        self.body = Some(Body::Payload {
            payload,
            content_type: content_type.map(str::to_string),
        });
        self
    }

    /// Sends `records` wrapped as `{field: records}` with a JSON content type.
    pub fn wrapped_json<T: Serialize>(mut self, field: &str, records: &T) -> WatsonResult<Self> {
        let mut wrapper = serde_json::Map::new();
        wrapper.insert(field.to_string(), serde_json::to_value(records)?);
        self.body = Some(Body::Wrapped(Value::Object(wrapper)));
        Ok(self)
    }

    /// Overrides the client timeout for this request.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produces the request.
    pub fn build(self) -> WatsonResult<HttpRequest> {
        let mut headers = merge_headers(self.headers);

        let body = match self.body {
            None => None,
            Some(Body::Wrapped(value)) => {
                set_header(&mut headers, CONTENT_TYPE, APPLICATION_JSON);
                Some(serde_json::to_vec(&value)?)
            }
            Some(Body::Payload {
                payload,
                content_type,
            }) => {
                // An explicit content_type argument beats a Content-Type
                // header from any layer.
                let declared = content_type
                    .or_else(|| get_header(&headers, CONTENT_TYPE).map(str::to_string))
                    .unwrap_or_else(|| payload.default_content_type().to_string());
                let encoding = ContentEncoding::from_content_type(&declared);
                set_header(&mut headers, CONTENT_TYPE, &declared);
                Some(payload.encode(encoding)?)
            }
        };

        for (name, value) in &headers {
            validate_header(name, value)?;
        }

        let query = self
            .query
            .into_iter()
            .filter_map(|(name, value)| value.encode().map(|v| (name, v)))
            .collect();

        Ok(HttpRequest {
            method: self.method,
            path: self.path,
            query,
            headers,
            body,
            timeout: self.timeout,
        })
    }
}

fn merge_headers(mut layered: Vec<(HeaderLayer, String, String)>) -> HashMap<String, String> {
    // Stable sort keeps insertion order inside a layer.
    layered.sort_by_key(|(layer, _, _)| *layer);
    let mut headers = HashMap::new();
    for (_, name, value) in layered {
        set_header(&mut headers, &name, &value);
    }
    headers
}

fn set_header(headers: &mut HashMap<String, String>, name: &str, value: &str) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

fn get_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn validate_header(name: &str, value: &str) -> WatsonResult<()> {
    http::header::HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
        WatsonError::validation_param(format!("invalid header name '{name}'"), name)
    })?;
    http::header::HeaderValue::from_str(value).map_err(|_| {
        WatsonError::validation_param(format!("invalid value for header '{name}'"), name)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("application/json", ContentEncoding::Json ; "plain json")]
    #[test_case("application/json; charset=utf-8", ContentEncoding::Json ; "json with charset")]
    #[test_case("application/vnd.watson+json", ContentEncoding::Json ; "json suffix")]
    #[test_case("text/plain;charset=utf-8", ContentEncoding::Raw ; "plain text")]
    #[test_case("text/html", ContentEncoding::Raw ; "html")]
    #[test_case("not a mime", ContentEncoding::Raw ; "garbage")]
    fn test_encoding_from_content_type(content_type: &str, expected: ContentEncoding) {
        assert_eq!(ContentEncoding::from_content_type(content_type), expected);
    }

    #[test]
    fn test_json_payload_is_serialized() {
        let request = RequestBuilder::post("/v3/tone")
            .payload(Payload::from(json!({"text": "hello"})), Some("application/json"))
            .build()
            .unwrap();

        let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"text": "hello"}));
        assert_eq!(request.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_text_payload_is_verbatim() {
        let text = "Team, I know that times are tough! <b>Product</b> sales have\n been disappointing.";
        let request = RequestBuilder::post("/v3/tone")
            .payload(Payload::from(text), Some("text/html"))
            .build()
            .unwrap();

        assert_eq!(request.body.as_deref().unwrap(), text.as_bytes());
        assert_eq!(request.header("Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_text_under_json_content_type_is_not_reencoded() {
        let raw = r#"{"text": "already serialized"}"#;
        let request = RequestBuilder::post("/v3/tone")
            .payload(Payload::from(raw), Some("application/json"))
            .build()
            .unwrap();

        assert_eq!(request.body.as_deref().unwrap(), raw.as_bytes());
    }

    #[test]
    fn test_non_object_json_values_are_serialized() {
        let array = Payload::from(json!(["a", 1, true]));
        assert_eq!(array.encode(ContentEncoding::Json).unwrap(), br#"["a",1,true]"#);
        assert_eq!(array.encode(ContentEncoding::Raw).unwrap(), br#"["a",1,true]"#);
        assert_eq!(Payload::from(json!(42)).encode(ContentEncoding::Json).unwrap(), b"42");
        assert_eq!(
            Payload::from(json!("quoted?")).encode(ContentEncoding::Json).unwrap(),
            b"quoted?"
        );
    }

    #[test]
    fn test_default_content_type_follows_payload() {
        let request = RequestBuilder::post("/p")
            .payload(Payload::from("plain"), None)
            .build()
            .unwrap();
        assert_eq!(request.header("Content-Type"), Some(TEXT_PLAIN_UTF8));

        let request = RequestBuilder::post("/p")
            .payload(Payload::from(json!({"a": 1})), None)
            .build()
            .unwrap();
        assert_eq!(request.header("Content-Type"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_wrapped_json_forces_content_type() {
        let mut custom = HashMap::new();
        custom.insert("content-type".to_string(), "text/plain".to_string());

        let request = RequestBuilder::post("/v3/tone_chat")
            .custom_headers(&custom)
            .wrapped_json("utterances", &vec![json!({"text": "hi"})])
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.header("Content-Type"), Some(APPLICATION_JSON));
        let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"utterances": [{"text": "hi"}]}));
    }

    #[test]
    fn test_query_encoding() {
        let tones: Vec<String> = vec!["emotion".into(), "language".into()];
        let request = RequestBuilder::post("/v3/tone")
            .query("version", "2017-09-21")
            .query("sentences", Some(false))
            .query("tones", tones)
            .query("empty", Vec::<String>::new())
            .query("missing", None::<bool>)
            .build()
            .unwrap();

        assert_eq!(
            request.query,
            vec![
                ("version".to_string(), "2017-09-21".to_string()),
                ("sentences".to_string(), "false".to_string()),
                ("tones".to_string(), "emotion,language".to_string()),
            ]
        );
    }

    #[test]
    fn test_absent_headers_are_omitted() {
        let request = RequestBuilder::post("/v3/tone")
            .header("Content-Language", None::<&str>)
            .header("Accept-Language", Some("fr"))
            .build()
            .unwrap();

        assert_eq!(request.header("Content-Language"), None);
        assert_eq!(request.header("Accept-Language"), Some("fr"));
    }

    #[test]
    fn test_header_precedence() {
        let client = vec![("X-Watson-Learning-Opt-Out".to_string(), "true".to_string())];
        let mut custom = HashMap::new();
        custom.insert("user-agent".to_string(), "my-app/1.0".to_string());
        custom.insert("x-watson-learning-opt-out".to_string(), "false".to_string());

        let request = RequestBuilder::post("/v3/profile")
            .custom_headers(&custom)
            .header("Accept", Some("text/csv"))
            .client_headers(&client)
            .sdk_headers("personality_insights", "V3", "profile")
            .build()
            .unwrap();

        assert_eq!(request.header("User-Agent"), Some("my-app/1.0"));
        assert_eq!(request.header("X-Watson-Learning-Opt-Out"), Some("false"));
        assert_eq!(request.header("Accept"), Some("text/csv"));
        assert_eq!(
            request.header("X-IBMCloud-SDK-Analytics"),
            Some("service_name=personality_insights;service_version=V3;operation_id=profile")
        );
        // One entry per header name regardless of case.
        let user_agents = request
            .headers
            .keys()
            .filter(|k| k.eq_ignore_ascii_case("user-agent"))
            .count();
        assert_eq!(user_agents, 1);
    }

    #[test]
    fn test_sdk_user_agent() {
        let headers = sdk_headers("tone_analyzer", "V3", "tone");
        let user_agent = &headers[0].1;
        assert!(user_agent.starts_with("watson-apis-rust-sdk-"));
        assert!(user_agent.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let result = RequestBuilder::post("/v3/tone")
            .header("Content-Language", Some("en\r\nX-Injected: 1"))
            .build();

        assert!(matches!(result, Err(WatsonError::Validation { .. })));
    }
}
