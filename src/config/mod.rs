//! Configuration module for the Watson client.
//!
//! A [`ServiceConfig`] is built once per client and never mutated. It holds
//! the service URL, the API version date sent with every call, transport
//! settings and the credentials the authenticator is built from.

use secrecy::SecretString;
use std::time::Duration;

use crate::auth::AuthenticationType;
use crate::errors::{WatsonError, WatsonResult};

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Username that marks the password as an IAM API key.
const APIKEY_USERNAME: &str = "apikey";

/// Credentials a client can be configured with.
#[derive(Clone, Default)]
pub struct Credentials {
    pub(crate) username: Option<String>,
    pub(crate) password: Option<SecretString>,
    pub(crate) iam_apikey: Option<SecretString>,
    pub(crate) iam_access_token: Option<SecretString>,
    pub(crate) iam_url: Option<String>,
    pub(crate) iam_client_id: Option<String>,
    pub(crate) iam_client_secret: Option<SecretString>,
    pub(crate) icp4d_access_token: Option<SecretString>,
    pub(crate) icp4d_url: Option<String>,
    pub(crate) bearer_token: Option<SecretString>,
}

impl Credentials {
    /// Username and password, required for basic and ICP4D.
    pub(crate) fn basic(&self) -> WatsonResult<(String, SecretString)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok((username.clone(), password.clone())),
            _ => Err(WatsonError::configuration(
                "username and password are required for this authentication type",
            )),
        }
    }

    /// IAM API key, either set directly or passed as the `apikey` user's password.
    pub(crate) fn iam_apikey(&self) -> WatsonResult<SecretString> {
        if let Some(apikey) = &self.iam_apikey {
            return Ok(apikey.clone());
        }
        match (self.username.as_deref(), &self.password) {
            (Some(APIKEY_USERNAME), Some(password)) => Ok(password.clone()),
            _ => Err(WatsonError::configuration(
                "iam_apikey is required for IAM authentication",
            )),
        }
    }

    /// Any application-managed access token.
    pub(crate) fn access_token(&self) -> WatsonResult<SecretString> {
        self.bearer_token
            .as_ref()
            .or(self.iam_access_token.as_ref())
            .or(self.icp4d_access_token.as_ref())
            .cloned()
            .ok_or_else(|| {
                WatsonError::configuration("an access token is required for bearer authentication")
            })
    }

    /// Picks an authentication type from whichever credentials are present.
    fn infer_type(&self) -> Option<AuthenticationType> {
        if self.bearer_token.is_some() {
            return Some(AuthenticationType::BearerToken);
        }
        if self.iam_apikey.is_some() || self.iam_access_token.is_some() {
            return Some(AuthenticationType::Iam);
        }
        if self.username.as_deref() == Some(APIKEY_USERNAME) && self.password.is_some() {
            return Some(AuthenticationType::Iam);
        }
        if self.icp4d_access_token.is_some() || self.icp4d_url.is_some() {
            return Some(AuthenticationType::Icp4d);
        }
        if self.username.is_some() && self.password.is_some() {
            return Some(AuthenticationType::Basic);
        }
        None
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |present: bool| if present { "[REDACTED]" } else { "None" };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(self.password.is_some()))
            .field("iam_apikey", &redact(self.iam_apikey.is_some()))
            .field("iam_access_token", &redact(self.iam_access_token.is_some()))
            .field("iam_url", &self.iam_url)
            .field("icp4d_access_token", &redact(self.icp4d_access_token.is_some()))
            .field("icp4d_url", &self.icp4d_url)
            .finish()
    }
}

/// Configuration for a Watson service client.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Base URL of the service instance.
    pub service_url: String,
    /// API version date (`YYYY-MM-DD`) sent as the `version` query parameter.
    pub version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Headers added to every request of this client.
    pub default_headers: Vec<(String, String)>,
    credentials: Credentials,
    authentication_type: Option<AuthenticationType>,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// With `PREFIX` the upper-cased service name (e.g. `TONE_ANALYZER`):
    ///
    /// - `PREFIX_VERSION` (required): API version date
    /// - `PREFIX_URL`: service URL
    /// - `PREFIX_APIKEY`, `PREFIX_IAM_ACCESS_TOKEN`, `PREFIX_IAM_URL`
    /// - `PREFIX_USERNAME`, `PREFIX_PASSWORD`
    /// - `PREFIX_ICP4D_URL`, `PREFIX_ICP4D_ACCESS_TOKEN`
    /// - `PREFIX_AUTH_TYPE`: one of `basic`, `iam`, `icp4d`, `bearertoken`
    /// - `PREFIX_TIMEOUT`: request timeout in seconds
    pub fn from_env(service_name: &str, default_url: &str) -> WatsonResult<Self> {
        ServiceConfigBuilder::from_env(service_name)?
            .default_url(default_url)
            .build()
    }

    /// The credentials this configuration carries.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The resolved authentication type, if any credentials were given.
    pub fn authentication_type(&self) -> Option<AuthenticationType> {
        self.authentication_type
    }

    /// Returns the full URL for an endpoint.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.service_url, path.trim_start_matches('/'))
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("service_url", &self.service_url)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .field("authentication_type", &self.authentication_type)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Builder for `ServiceConfig`.
#[derive(Default)]
pub struct ServiceConfigBuilder {
    service_url: Option<String>,
    default_url: Option<String>,
    version: Option<String>,
    timeout: Option<Duration>,
    default_headers: Vec<(String, String)>,
    credentials: Credentials,
    authentication_type: Option<AuthenticationType>,
}

impl ServiceConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder pre-filled from `<SERVICE_NAME>_*` environment variables.
    pub fn from_env(service_name: &str) -> WatsonResult<Self> {
        let prefix = service_name.to_ascii_uppercase().replace('-', "_");
        let var = |suffix: &str| std::env::var(format!("{prefix}_{suffix}")).ok();

        let mut builder = Self::new();

        if let Some(version) = var("VERSION") {
            builder = builder.version(version);
        }
        if let Some(url) = var("URL") {
            builder = builder.service_url(url);
        }
        if let Some(username) = var("USERNAME") {
            builder = builder.username(username);
        }
        if let Some(password) = var("PASSWORD") {
            builder = builder.password(password);
        }
        if let Some(apikey) = var("APIKEY").or_else(|| var("IAM_APIKEY")) {
            builder = builder.iam_apikey(apikey);
        }
        if let Some(token) = var("IAM_ACCESS_TOKEN") {
            builder = builder.iam_access_token(token);
        }
        if let Some(url) = var("IAM_URL") {
            builder = builder.iam_url(url);
        }
        if let Some(url) = var("ICP4D_URL") {
            builder = builder.icp4d_url(url);
        }
        if let Some(token) = var("ICP4D_ACCESS_TOKEN") {
            builder = builder.icp4d_access_token(token);
        }
        if let Some(auth_type) = var("AUTH_TYPE") {
            builder = builder.authentication_type(auth_type.parse()?);
        }
        if let Some(timeout) = var("TIMEOUT").and_then(|t| t.parse::<u64>().ok()) {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(builder)
    }

    /// Sets the API version date (`YYYY-MM-DD`).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the service URL.
    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Sets the URL used when no service URL was given.
    pub fn default_url(mut self, url: impl Into<String>) -> Self {
        self.default_url = Some(url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the username for basic or ICP4D authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.credentials.username = Some(username.into());
        self
    }

    /// Sets the password for basic or ICP4D authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.credentials.password = Some(SecretString::new(password.into()));
        self
    }

    /// Sets an IAM API key; the SDK manages the token.
    pub fn iam_apikey(mut self, apikey: impl Into<String>) -> Self {
        self.credentials.iam_apikey = Some(SecretString::new(apikey.into()));
        self
    }

    /// Sets an IAM access token managed by the application.
    pub fn iam_access_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.iam_access_token = Some(SecretString::new(token.into()));
        self
    }

    /// Overrides the IAM token endpoint.
    pub fn iam_url(mut self, url: impl Into<String>) -> Self {
        self.credentials.iam_url = Some(url.into());
        self
    }

    /// Sets the client credentials sent to the IAM token endpoint.
    pub fn iam_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.credentials.iam_client_id = Some(client_id.into());
        self.credentials.iam_client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Sets an ICP4D access token managed by the application.
    pub fn icp4d_access_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.icp4d_access_token = Some(SecretString::new(token.into()));
        self
    }

    /// Sets the ICP4D cluster URL for SDK-managed tokens.
    pub fn icp4d_url(mut self, url: impl Into<String>) -> Self {
        self.credentials.icp4d_url = Some(url.into());
        self
    }

    /// Sets a generic bearer token managed by the application.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.credentials.bearer_token = Some(SecretString::new(token.into()));
        self
    }

    /// Forces an authentication type instead of inferring it.
    pub fn authentication_type(mut self, auth_type: AuthenticationType) -> Self {
        self.authentication_type = Some(auth_type);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> WatsonResult<ServiceConfig> {
        let version = self.version.ok_or_else(|| {
            WatsonError::configuration("version must be provided (YYYY-MM-DD)")
        })?;
        validate_version(&version)?;

        let service_url = self
            .service_url
            .or(self.default_url)
            .ok_or_else(|| WatsonError::configuration("service URL must be provided"))?
            .trim_end_matches('/')
            .to_string();
        validate_service_url(&service_url)?;

        if self.credentials.username.as_deref() == Some(APIKEY_USERNAME)
            && self.credentials.iam_apikey.is_none()
        {
            tracing::debug!("username 'apikey' given; treating password as an IAM API key");
        }

        let authentication_type = self
            .authentication_type
            .or_else(|| self.credentials.infer_type());

        Ok(ServiceConfig {
            service_url,
            version,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            default_headers: self.default_headers,
            credentials: self.credentials,
            authentication_type,
        })
    }
}

fn validate_version(version: &str) -> WatsonResult<()> {
    chrono::NaiveDate::parse_from_str(version, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| {
            WatsonError::configuration(format!(
                "version '{version}' is not a YYYY-MM-DD date: {e}"
            ))
        })
}

fn validate_service_url(service_url: &str) -> WatsonResult<()> {
    let parsed = url::Url::parse(service_url)?;

    if service_url.contains(['{', '}', '"']) {
        return Err(WatsonError::configuration(
            "service URL contains braces or quotation marks; remove them",
        ));
    }

    let is_loopback = matches!(
        parsed.host_str(),
        Some("localhost" | "127.0.0.1" | "[::1]")
    );

    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_loopback => Ok(()),
        _ => Err(WatsonError::configuration(
            "service URL must use HTTPS",
        )),
    }
}
