//! HTTP transport layer for the Watson client.
//!
//! [`HttpTransport`] moves bytes; [`RequestExecutor`] sits on top of it and
//! owns the per-call pipeline: attach credentials, dispatch once, turn the
//! response into a [`DetailedResponse`] or a typed error.

mod http;
mod response;

pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, HttpTransportImpl};
pub use response::{DetailedResponse, ResponseBody};

use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::auth::Authenticator;
use crate::errors::{WatsonError, WatsonResult};
use crate::observability::{redact_headers, Observability, RequestTimer};

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Timeout error.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Timeout duration.
        timeout: Duration,
    },

    /// Invalid response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

impl From<TransportError> for WatsonError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout } => WatsonError::Timeout { timeout },
            TransportError::Connection { message } => WatsonError::Transport {
                message,
                cause: Some("connection".to_string()),
            },
            TransportError::InvalidResponse { message } => WatsonError::Transport {
                message,
                cause: None,
            },
        }
    }
}

/// Sends built requests with authentication applied.
///
/// One attempt per call: no retry, no backoff. Shared by every operation of
/// a service client and safe for concurrent use.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    authenticator: Arc<dyn Authenticator>,
    observability: Arc<Observability>,
}

impl RequestExecutor {
    /// Creates a new executor.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        authenticator: Arc<dyn Authenticator>,
        observability: Arc<Observability>,
    ) -> Self {
        Self {
            transport,
            authenticator,
            observability,
        }
    }

    /// Returns the authenticator.
    pub fn authenticator(&self) -> &Arc<dyn Authenticator> {
        &self.authenticator
    }

    /// Authenticates and sends `request`, returning the response envelope.
    #[instrument(
        skip(self, request),
        fields(
            method = request.method.as_str(),
            path = %request.path,
            status = tracing::field::Empty,
            duration_ms = tracing::field::Empty
        )
    )]
    pub async fn execute(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> WatsonResult<DetailedResponse> {
        let timer = RequestTimer::new(operation);
        let result = self.dispatch(request).await;

        let span = tracing::Span::current();
        span.record("duration_ms", timer.elapsed().as_millis() as u64);

        match &result {
            Ok(response) => {
                span.record("status", response.status());
                self.observability.record_success(operation, timer.elapsed());
            }
            Err(error) => {
                if let Some(status) = error.status() {
                    span.record("status", status);
                }
                tracing::warn!(error = %error, "Request failed");
                self.observability
                    .record_failure(operation, timer.elapsed(), error.kind());
            }
        }

        result
    }

    async fn dispatch(&self, mut request: HttpRequest) -> WatsonResult<DetailedResponse> {
        // Credentials are attached here, not when the request is built, so a
        // token refreshed in between is the one that goes out.
        self.authenticator.authenticate(&mut request.headers).await?;

        tracing::debug!(
            headers = ?redact_headers(&request.headers),
            query = ?request.query,
            body_len = request.body.as_ref().map_or(0, Vec::len),
            "Dispatching request"
        );

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(WatsonError::from_response(
                response.status,
                &response.headers,
                &response.body,
            ));
        }

        Ok(DetailedResponse::from_http(response))
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("authentication_type", &self.authenticator.authentication_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockAuthenticator, MockResponse, MockTransport};

    fn executor(transport: Arc<MockTransport>) -> RequestExecutor {
        RequestExecutor::new(
            transport,
            Arc::new(MockAuthenticator::default()),
            Arc::new(Observability::default()),
        )
    }

    #[tokio::test]
    async fn test_execute_applies_auth_before_dispatch() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::json(&serde_json::json!({"ok": true})));

        let response = executor(Arc::clone(&transport))
            .execute("test", HttpRequest::post("/v3/tone"))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.header("Authorization"), Some("Bearer mock-token"));
    }

    #[tokio::test]
    async fn test_execute_accepts_any_2xx() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::text("accepted").with_status(202));

        let response = executor(Arc::clone(&transport))
            .execute("test", HttpRequest::post("/v3/tone"))
            .await
            .unwrap();

        assert_eq!(response.status(), 202);
        assert_eq!(response.text(), Some("accepted"));
    }

    #[tokio::test]
    async fn test_execute_maps_403_to_authentication() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(403, "Forbidden");

        let error = executor(Arc::clone(&transport))
            .execute("test", HttpRequest::post("/v3/tone"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            WatsonError::Authentication {
                status: Some(403),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_execute_maps_500_to_api_error() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(500, "Internal Server Error");

        let error = executor(Arc::clone(&transport))
            .execute("test", HttpRequest::post("/v3/tone"))
            .await
            .unwrap_err();

        assert_eq!(error.status(), Some(500));
        assert!(error.body().unwrap().contains("Internal Server Error"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_execute_records_metrics() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::json(&serde_json::json!({})));
        transport.queue_error(400, "bad");

        let observability = Arc::new(Observability::default());
        let executor = RequestExecutor::new(
            Arc::clone(&transport) as Arc<dyn HttpTransport>,
            Arc::new(MockAuthenticator::default()),
            Arc::clone(&observability),
        );

        executor.execute("tone", HttpRequest::post("/v3/tone")).await.unwrap();
        let _ = executor.execute("tone", HttpRequest::post("/v3/tone")).await;

        let metrics = observability.metrics().get_metrics();
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.errors.get("api"), Some(&1));
    }
}
