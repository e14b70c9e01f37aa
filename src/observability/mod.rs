//! Observability module for the Watson client.
//!
//! Provides logging setup, header redaction and request metrics for
//! monitoring service calls.

mod logging;
mod metrics;

pub use logging::{redact, redact_headers, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, RequestMetrics};

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Enable metrics collection.
    pub enable_metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
        }
    }
}

/// Observability facade shared by every operation of a client.
pub struct Observability {
    metrics: Arc<dyn MetricsCollector>,
    config: ObservabilityConfig,
}

impl Observability {
    /// Creates a new observability facade.
    pub fn new(config: ObservabilityConfig) -> Self {
        Self {
            metrics: Arc::new(DefaultMetricsCollector::new()),
            config,
        }
    }

    /// Creates with a custom metrics collector.
    pub fn with_components(
        metrics: Arc<dyn MetricsCollector>,
        config: ObservabilityConfig,
    ) -> Self {
        Self { metrics, config }
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }

    /// Records a successful request.
    pub fn record_success(&self, operation: &str, duration: Duration) {
        if self.config.enable_metrics {
            self.metrics.record_request(operation, true, duration);
        }
    }

    /// Records a failed request.
    pub fn record_failure(&self, operation: &str, duration: Duration, error_kind: &str) {
        if self.config.enable_metrics {
            self.metrics.record_request(operation, false, duration);
            self.metrics.record_error(error_kind);
        }
    }
}

impl Default for Observability {
    fn default() -> Self {
        Self::new(ObservabilityConfig::default())
    }
}

impl std::fmt::Debug for Observability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observability")
            .field("config", &self.config)
            .finish()
    }
}

/// Request timer for measuring operation duration.
pub struct RequestTimer {
    start: Instant,
    operation: String,
}

impl RequestTimer {
    /// Creates a new request timer.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
        }
    }

    /// Returns the elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_metrics_record_nothing() {
        let observability = Observability::new(ObservabilityConfig {
            enable_metrics: false,
        });

        observability.record_success("tone", Duration::from_millis(5));
        observability.record_failure("tone", Duration::from_millis(5), "api");

        assert_eq!(observability.metrics().get_metrics().total_requests, 0);
    }

    #[test]
    fn test_failure_records_error_kind() {
        let observability = Observability::default();

        observability.record_failure("profile", Duration::from_millis(5), "authentication");

        let metrics = observability.metrics().get_metrics();
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.errors.get("authentication"), Some(&1));
        assert_eq!(metrics.operations.get("profile"), Some(&1));
    }

    #[test]
    fn test_request_timer() {
        let timer = RequestTimer::new("tone_chat");
        assert_eq!(timer.operation(), "tone_chat");
        assert!(timer.elapsed() < Duration::from_secs(5));
    }
}
