//! The response envelope returned by every operation.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use super::HttpResponse;
use crate::errors::{header_value, WatsonError, WatsonResult};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// JSON document (response `Content-Type` was JSON).
    Json(serde_json::Value),
    /// Text body (`text/*`, e.g. CSV, or JSON that failed to parse).
    Text(String),
    /// Anything else, as received.
    Binary(Bytes),
    /// No body.
    Empty,
}

/// Uniform success result: status, headers and body of a 2xx response.
///
/// The body is never interpreted beyond choosing between JSON, text and raw
/// bytes from the response `Content-Type`.
#[derive(Debug, Clone)]
pub struct DetailedResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: ResponseBody,
}

impl DetailedResponse {
    /// Creates a response envelope.
    pub fn new(status: u16, headers: HashMap<String, String>, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Builds the envelope from a raw transport response.
    pub fn from_http(response: HttpResponse) -> Self {
        let content_type = header_value(&response.headers, "content-type");
        let body = decode_body(content_type.as_deref(), response.body);

        Self {
            status: response.status,
            headers: response.headers,
            body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Consumes the envelope and returns the body.
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// Returns the JSON body, if the response was JSON.
    pub fn json_value(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text body, if the response was text.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Deserializes the body into a caller-defined type.
    pub fn json<T: DeserializeOwned>(&self) -> WatsonResult<T> {
        match &self.body {
            ResponseBody::Json(value) => Ok(T::deserialize(value)?),
            ResponseBody::Text(text) => Ok(serde_json::from_str(text)?),
            ResponseBody::Binary(bytes) => Ok(serde_json::from_slice(bytes)?),
            ResponseBody::Empty => Err(WatsonError::Serialization {
                message: "Response body is empty".to_string(),
            }),
        }
    }
}

fn decode_body(content_type: Option<&str>, body: Vec<u8>) -> ResponseBody {
    if body.is_empty() {
        return ResponseBody::Empty;
    }

    let mime = content_type.and_then(|ct| ct.parse::<mime::Mime>().ok());
    let is_json = mime.as_ref().is_some_and(|m| {
        m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON)
    });
    let is_text = mime.as_ref().is_some_and(|m| m.type_() == mime::TEXT);

    if is_json {
        match serde_json::from_slice(&body) {
            Ok(value) => return ResponseBody::Json(value),
            Err(e) => {
                tracing::warn!(error = %e, "Response declared JSON but did not parse; returning text");
            }
        }
    }

    if is_json || is_text {
        return match String::from_utf8(body) {
            Ok(text) => ResponseBody::Text(text),
            Err(e) => ResponseBody::Binary(Bytes::from(e.into_bytes())),
        };
    }

    ResponseBody::Binary(Bytes::from(body))
}
