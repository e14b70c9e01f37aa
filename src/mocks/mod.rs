//! Mock implementations for testing.
//!
//! Provides a scripted transport and a fixed-credential authenticator for
//! unit testing without making real API calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::{set_authorization, AuthenticationType, Authenticator};
use crate::errors::WatsonResult;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
        .with_header("content-type", "application/json")
    }

    /// Creates a successful plain-text response.
    pub fn text(body: &str) -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec(),
        }
        .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Creates an error response shaped like a Watson error body.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(&serde_json::json!({
            "code": status,
            "error": message,
        }))
        .with_status(status)
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// Mock HTTP transport for testing.
///
/// Queued responses are returned in order; once the queue is empty the
/// default response is used, or a 500 if none was set.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<MockResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<MockResponse>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues an error response.
    pub fn queue_error(&self, status: u16, message: &str) {
        self.queue(MockResponse::error(status, message));
    }

    /// Queues a connection failure.
    pub fn queue_connection_error(&self, message: &str) {
        lock(&self.responses).push_back(Err(message.to_string()));
    }

    /// Sets the default response.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_response(&self) -> Result<MockResponse, String> {
        if let Some(response) = lock(&self.responses).pop_front() {
            return response;
        }
        Ok(lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::error(500, "No mock response configured")))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);

        let response = self
            .next_response()
            .map_err(|message| TransportError::Connection { message })?;

        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Authenticator that writes a fixed bearer token and counts its calls.
pub struct MockAuthenticator {
    token: String,
    calls: AtomicUsize,
}

impl MockAuthenticator {
    /// Creates a new mock authenticator.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `authenticate` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAuthenticator {
    fn default() -> Self {
        Self::new("mock-token")
    }
}

#[async_trait]
impl Authenticator for MockAuthenticator {
    async fn authenticate(&self, headers: &mut HashMap<String, String>) -> WatsonResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        set_authorization(headers, format!("Bearer {}", self.token));
        Ok(())
    }

    fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::BearerToken
    }

    fn validate(&self) -> WatsonResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for MockAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAuthenticator")
            .field("calls", &self.call_count())
            .finish()
    }
}
