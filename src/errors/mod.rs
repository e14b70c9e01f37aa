//! Error types for the Watson client.
//!
//! Every failure an operation can produce is a [`WatsonError`]. Validation
//! errors are raised before any network call; authentication, API and
//! transport errors come out of the request executor and carry the HTTP
//! status and the remote error body verbatim.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for Watson operations.
pub type WatsonResult<T> = Result<T, WatsonError>;

/// Header carrying the Watson transaction ID.
pub const TRANSACTION_ID_HEADER: &str = "x-global-transaction-id";

/// Error type for Watson client operations.
#[derive(Debug, Error)]
pub enum WatsonError {
    /// Configuration error (missing version, bad URL, missing credentials).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Caller input is missing or malformed. Never reaches the network.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
        /// The parameter that caused the error.
        param: Option<String>,
    },

    /// Credential rejected by the service (401/403) or a token could not be
    /// obtained.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// HTTP status returned by the remote, if any.
        status: Option<u16>,
        /// Error message extracted from the response.
        message: String,
        /// Raw response body.
        body: Option<String>,
    },

    /// The service answered with a non-2xx status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response.
        message: String,
        /// Raw response body.
        body: Option<String>,
        /// Watson transaction ID for support requests.
        transaction_id: Option<String>,
    },

    /// Connection-level failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Underlying cause.
        cause: Option<String>,
    },

    /// The request did not complete in time.
    #[error("Request timeout after {timeout:?}")]
    Timeout {
        /// Configured timeout.
        timeout: Duration,
    },

    /// Request or response (de)serialization failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl WatsonError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        WatsonError::Validation {
            message: message.into(),
            param: None,
        }
    }

    /// Creates a validation error naming the offending parameter.
    pub fn validation_param(message: impl Into<String>, param: impl Into<String>) -> Self {
        WatsonError::Validation {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Creates a validation error for a missing required parameter.
    pub fn missing_param(param: &str) -> Self {
        WatsonError::validation_param(format!("{param} must be provided"), param)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        WatsonError::Configuration {
            message: message.into(),
        }
    }

    /// Creates an authentication error without a response.
    pub fn authentication(message: impl Into<String>) -> Self {
        WatsonError::Authentication {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Builds the error for a non-2xx response.
    ///
    /// 401 and 403 map to [`WatsonError::Authentication`]; every other status
    /// maps to [`WatsonError::Api`]. The body is kept as received.
    pub fn from_response(status: u16, headers: &HashMap<String, String>, body: &[u8]) -> Self {
        let raw = if body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(body).into_owned())
        };
        let message = extract_error_message(body).unwrap_or_else(|| default_message(status));

        match status {
            401 | 403 => WatsonError::Authentication {
                status: Some(status),
                message,
                body: raw,
            },
            _ => WatsonError::Api {
                status,
                message,
                body: raw,
                transaction_id: header_value(headers, TRANSACTION_ID_HEADER),
            },
        }
    }

    /// Returns the HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            WatsonError::Api { status, .. } => Some(*status),
            WatsonError::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns the raw remote error body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            WatsonError::Api { body, .. } | WatsonError::Authentication { body, .. } => {
                body.as_deref()
            }
            _ => None,
        }
    }

    /// Returns true if the error was detected before any network call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WatsonError::Validation { .. } | WatsonError::Configuration { .. }
        )
    }

    /// Short, stable name of the variant, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            WatsonError::Configuration { .. } => "configuration",
            WatsonError::Validation { .. } => "validation",
            WatsonError::Authentication { .. } => "authentication",
            WatsonError::Api { .. } => "api",
            WatsonError::Transport { .. } => "transport",
            WatsonError::Timeout { .. } => "timeout",
            WatsonError::Serialization { .. } => "serialization",
        }
    }
}

/// Pulls a human-readable message out of a Watson error body.
///
/// Watson services are not consistent about the field name, so the usual
/// candidates are tried in order.
fn extract_error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;

    if let Some(first) = value
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
    {
        if let Some(msg) = first.get("message").and_then(|m| m.as_str()) {
            return Some(msg.to_string());
        }
    }

    ["error", "message", "errorMessage", "msg", "statusMessage"]
        .iter()
        .find_map(|key| match value.get(*key) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Object(obj)) => obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        })
}

fn default_message(status: u16) -> String {
    match status {
        400 => "Bad request".to_string(),
        401 => "Unauthorized: Access is denied due to invalid credentials".to_string(),
        403 => "Forbidden: Service refused the request".to_string(),
        404 => "Not found".to_string(),
        413 => "Payload too large".to_string(),
        415 => "Unsupported media type".to_string(),
        500 => "Internal server error".to_string(),
        503 => "Service unavailable".to_string(),
        _ => format!("Unexpected status: {status}"),
    }
}

pub(crate) fn header_value(headers: &HashMap<String, String>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.clone())
}

impl From<serde_json::Error> for WatsonError {
    fn from(err: serde_json::Error) -> Self {
        WatsonError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for WatsonError {
    fn from(err: url::ParseError) -> Self {
        WatsonError::Configuration {
            message: format!("Invalid URL: {err}"),
        }
    }
}
