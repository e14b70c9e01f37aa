//! Shared service client.
//!
//! Every Watson service wraps a [`ServiceClient`]: it binds the immutable
//! configuration to a transport and authenticator and hands each operation a
//! [`RequestBuilder`] preloaded with the SDK headers and `version` parameter.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{self, AuthenticationType, Authenticator};
use crate::config::{ServiceConfig, ServiceConfigBuilder};
use crate::errors::{WatsonError, WatsonResult};
use crate::observability::{MetricsCollector, Observability, ObservabilityConfig};
use crate::request::RequestBuilder;
use crate::transport::{
    DetailedResponse, HttpMethod, HttpRequest, HttpTransport, HttpTransportImpl, RequestExecutor,
};

/// A Watson service bound to a [`ServiceClient`].
pub trait WatsonService: Sized {
    /// Name used in analytics headers and environment variable prefixes.
    const SERVICE_NAME: &'static str;
    /// Human-readable service name.
    const DISPLAY_NAME: &'static str;
    /// URL used when none is configured.
    const DEFAULT_SERVICE_URL: &'static str;
    /// API major version reported in analytics headers.
    const SERVICE_VERSION: &'static str = "V3";

    /// Wraps a configured client.
    fn from_client(client: ServiceClient) -> Self;

    /// Returns the wrapped client.
    fn client(&self) -> &ServiceClient;

    /// Creates a builder for this service.
    fn builder() -> ServiceClientBuilder<Self> {
        ServiceClientBuilder::new()
    }

    /// Creates the service from `<SERVICE_NAME>_*` environment variables.
    fn from_env() -> WatsonResult<Self> {
        ServiceClientBuilder::from_env()?.build()
    }
}

/// Configuration, transport and authenticator shared by a service's operations.
///
/// Cheap to clone; clones share the connection pool and token cache.
#[derive(Clone)]
pub struct ServiceClient {
    config: Arc<ServiceConfig>,
    executor: Arc<RequestExecutor>,
    observability: Arc<Observability>,
    service_name: &'static str,
    service_version: &'static str,
}

impl ServiceClient {
    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the configured API version date.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Returns the service URL.
    pub fn service_url(&self) -> &str {
        &self.config.service_url
    }

    /// Returns the authentication type in use.
    pub fn authentication_type(&self) -> AuthenticationType {
        self.executor.authenticator().authentication_type()
    }

    /// Returns the observability facade.
    pub fn observability(&self) -> &Observability {
        &self.observability
    }

    /// Starts a request for `operation`, preloaded with SDK and client
    /// headers and the `version` query parameter.
    pub fn request(&self, method: HttpMethod, path: &str, operation: &str) -> RequestBuilder {
        RequestBuilder::new(method, path)
            .sdk_headers(self.service_name, self.service_version, operation)
            .client_headers(&self.config.default_headers)
            .query("version", self.config.version.as_str())
    }

    /// Authenticates and sends a built request.
    pub async fn send(&self, operation: &str, request: HttpRequest) -> WatsonResult<DetailedResponse> {
        self.executor.execute(operation, request).await
    }
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service_name", &self.service_name)
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish()
    }
}

/// Builder for a Watson service.
pub struct ServiceClientBuilder<S> {
    config_builder: ServiceConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    authenticator: Option<Arc<dyn Authenticator>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    enable_metrics: bool,
    _service: PhantomData<fn() -> S>,
}

impl<S: WatsonService> ServiceClientBuilder<S> {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::from_config_builder(ServiceConfigBuilder::new())
    }

    /// Creates a builder pre-filled from environment variables.
    pub fn from_env() -> WatsonResult<Self> {
        Ok(Self::from_config_builder(ServiceConfigBuilder::from_env(
            S::SERVICE_NAME,
        )?))
    }

    fn from_config_builder(config_builder: ServiceConfigBuilder) -> Self {
        Self {
            config_builder: config_builder.default_url(S::DEFAULT_SERVICE_URL),
            transport: None,
            authenticator: None,
            metrics: None,
            enable_metrics: true,
            _service: PhantomData,
        }
    }

    fn map_config(mut self, f: impl FnOnce(ServiceConfigBuilder) -> ServiceConfigBuilder) -> Self {
        self.config_builder = f(self.config_builder);
        self
    }

    /// Sets the API version date (`YYYY-MM-DD`).
    pub fn version(self, version: impl Into<String>) -> Self {
        self.map_config(|c| c.version(version))
    }

    /// Sets the service URL.
    pub fn service_url(self, url: impl Into<String>) -> Self {
        self.map_config(|c| c.service_url(url))
    }

    /// Sets the request timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map_config(|c| c.timeout(timeout))
    }

    /// Adds a header sent with every request.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map_config(|c| c.header(name, value))
    }

    /// Sets basic credentials. A username of `apikey` selects IAM.
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.map_config(|c| c.username(username).password(password))
    }

    /// Sets an IAM API key.
    pub fn iam_apikey(self, apikey: impl Into<String>) -> Self {
        self.map_config(|c| c.iam_apikey(apikey))
    }

    /// Sets a user-managed IAM access token.
    pub fn iam_access_token(self, token: impl Into<String>) -> Self {
        self.map_config(|c| c.iam_access_token(token))
    }

    /// Overrides the IAM token endpoint.
    pub fn iam_url(self, url: impl Into<String>) -> Self {
        self.map_config(|c| c.iam_url(url))
    }

    /// Sets IAM client credentials.
    pub fn iam_client_credentials(
        self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.map_config(|c| c.iam_client_credentials(client_id, client_secret))
    }

    /// Sets a user-managed ICP4D access token.
    pub fn icp4d_access_token(self, token: impl Into<String>) -> Self {
        self.map_config(|c| c.icp4d_access_token(token))
    }

    /// Sets the ICP4D cluster URL.
    pub fn icp4d_url(self, url: impl Into<String>) -> Self {
        self.map_config(|c| c.icp4d_url(url))
    }

    /// Sets a generic user-managed bearer token.
    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.map_config(|c| c.bearer_token(token))
    }

    /// Forces an authentication type.
    pub fn authentication_type(self, auth_type: AuthenticationType) -> Self {
        self.map_config(|c| c.authentication_type(auth_type))
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom authenticator; configured credentials are then ignored.
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enables or disables metrics collection.
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.enable_metrics = enabled;
        self
    }

    /// Builds the service.
    pub fn build(self) -> WatsonResult<S> {
        let config = Arc::new(self.config_builder.build()?);

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                HttpTransportImpl::new(&config.service_url, config.timeout).map_err(|e| {
                    WatsonError::configuration(format!("failed to create HTTP client: {e}"))
                })?,
            ),
        };

        let authenticator = match self.authenticator {
            Some(a) => {
                a.validate()?;
                a
            }
            None => auth::from_config(&config, Arc::clone(&transport))?,
        };

        let observability_config = ObservabilityConfig {
            enable_metrics: self.enable_metrics,
        };
        let observability = Arc::new(match self.metrics {
            Some(metrics) => Observability::with_components(metrics, observability_config),
            None => Observability::new(observability_config),
        });

        let executor = Arc::new(RequestExecutor::new(
            transport,
            authenticator,
            Arc::clone(&observability),
        ));

        tracing::debug!(
            service = S::SERVICE_NAME,
            service_url = %config.service_url,
            version = %config.version,
            "{} client created",
            S::DISPLAY_NAME
        );

        Ok(S::from_client(ServiceClient {
            config,
            executor,
            observability,
            service_name: S::SERVICE_NAME,
            service_version: S::SERVICE_VERSION,
        }))
    }
}

impl<S: WatsonService> Default for ServiceClientBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
