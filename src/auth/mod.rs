//! Authentication module for the Watson client.
//!
//! An [`Authenticator`] produces the `Authorization` header for every
//! outgoing request. Basic and user-managed bearer tokens are static; IAM and
//! ICP4D API keys go through a [`TokenManagerAuthenticator`] that caches the
//! exchanged token and refreshes it when it nears expiry.

mod token;

pub use token::{
    AccessToken, IamTokenSource, Icp4dTokenSource, TokenManagerAuthenticator, TokenSource,
    DEFAULT_IAM_URL, DEFAULT_REFRESH_BUFFER,
};

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::errors::{WatsonError, WatsonResult};
use crate::transport::HttpTransport;

/// Name of the header every authenticator writes.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Authentication pattern used by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationType {
    /// HTTP Basic with username and password.
    Basic,
    /// IBM Cloud IAM API key, token managed by the SDK.
    Iam,
    /// IBM Cloud Pak for Data, token managed by the SDK.
    Icp4d,
    /// Bearer token managed by the application.
    BearerToken,
}

impl AuthenticationType {
    /// Returns the configuration name of this authentication type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationType::Basic => "basic",
            AuthenticationType::Iam => "iam",
            AuthenticationType::Icp4d => "icp4d",
            AuthenticationType::BearerToken => "bearertoken",
        }
    }
}

impl fmt::Display for AuthenticationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthenticationType {
    type Err = WatsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthenticationType::Basic),
            "iam" => Ok(AuthenticationType::Iam),
            "icp4d" | "cp4d" => Ok(AuthenticationType::Icp4d),
            "bearertoken" | "bearer" => Ok(AuthenticationType::BearerToken),
            other => Err(WatsonError::configuration(format!(
                "Unknown authentication type '{other}' (expected basic, iam, icp4d or bearertoken)"
            ))),
        }
    }
}

/// Supplies credentials for outgoing requests.
///
/// `authenticate` is called once per request, immediately before dispatch.
/// Implementations must be safe for concurrent callers.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Writes the current credential into `headers`.
    async fn authenticate(&self, headers: &mut HashMap<String, String>) -> WatsonResult<()>;

    /// The authentication pattern this authenticator implements.
    fn authentication_type(&self) -> AuthenticationType;

    /// Checks the configured credentials without touching the network.
    fn validate(&self) -> WatsonResult<()>;
}

/// Rejects credential values that were pasted with surrounding braces or
/// quotes, a common copy error from service credential JSON.
pub(crate) fn check_credential(name: &str, value: &str) -> WatsonResult<()> {
    if value.is_empty() {
        return Err(WatsonError::configuration(format!("{name} cannot be empty")));
    }
    let first = value.chars().next();
    let last = value.chars().last();
    if matches!(first, Some('{' | '"')) || matches!(last, Some('}' | '"')) {
        return Err(WatsonError::configuration(format!(
            "{name} starts or ends with a brace or quotation mark; remove them from your credentials"
        )));
    }
    Ok(())
}

/// Replaces any `Authorization` header, whatever its case, with `value`.
pub(crate) fn set_authorization(headers: &mut HashMap<String, String>, value: String) {
    headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
    headers.insert(AUTHORIZATION_HEADER.to_string(), value);
}

pub(crate) fn basic_header_value(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// HTTP Basic authentication.
pub struct BasicAuthenticator {
    username: String,
    password: SecretString,
}

impl BasicAuthenticator {
    /// Creates a new basic authenticator.
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Creates from plain strings.
    pub fn from_strings(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(username, SecretString::new(password.into()))
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(&self, headers: &mut HashMap<String, String>) -> WatsonResult<()> {
        set_authorization(
            headers,
            basic_header_value(&self.username, self.password.expose_secret()),
        );
        Ok(())
    }

    fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::Basic
    }

    fn validate(&self) -> WatsonResult<()> {
        check_credential("username", &self.username)?;
        check_credential("password", self.password.expose_secret())
    }
}

impl fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bearer token supplied and refreshed by the application.
pub struct BearerTokenAuthenticator {
    token: SecretString,
}

impl BearerTokenAuthenticator {
    /// Creates a new bearer token authenticator.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Creates from a plain string.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self::new(SecretString::new(token.into()))
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, headers: &mut HashMap<String, String>) -> WatsonResult<()> {
        set_authorization(headers, format!("Bearer {}", self.token.expose_secret()));
        Ok(())
    }

    fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::BearerToken
    }

    fn validate(&self) -> WatsonResult<()> {
        check_credential("access token", self.token.expose_secret())
    }
}

impl fmt::Debug for BearerTokenAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerTokenAuthenticator")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Builds the authenticator described by `config`.
///
/// Token exchanges for IAM and ICP4D go through `transport`, the same one
/// the service calls use.
pub fn from_config(
    config: &ServiceConfig,
    transport: Arc<dyn HttpTransport>,
) -> WatsonResult<Arc<dyn Authenticator>> {
    let credentials = config.credentials();
    let auth_type = config.authentication_type().ok_or_else(|| {
        WatsonError::configuration(
            "No credentials configured: provide username/password, an IAM API key, or an access token",
        )
    })?;

    let authenticator: Arc<dyn Authenticator> = match auth_type {
        AuthenticationType::Basic => {
            let (username, password) = credentials.basic()?;
            Arc::new(BasicAuthenticator::new(username, password))
        }
        AuthenticationType::BearerToken => {
            let token = credentials.access_token()?;
            Arc::new(BearerTokenAuthenticator::new(token))
        }
        AuthenticationType::Iam => {
            if let Some(token) = credentials.iam_access_token.clone() {
                Arc::new(BearerTokenAuthenticator::new(token))
            } else {
                let apikey = credentials.iam_apikey()?;
                let mut source = IamTokenSource::new(apikey, transport);
                if let Some(url) = &credentials.iam_url {
                    source = source.with_url(url.clone());
                }
                if let Some(client_id) = &credentials.iam_client_id {
                    source = source.with_client_credentials(
                        client_id.clone(),
                        credentials.iam_client_secret.clone(),
                    );
                }
                Arc::new(TokenManagerAuthenticator::new(source))
            }
        }
        AuthenticationType::Icp4d => {
            if let Some(token) = credentials.icp4d_access_token.clone() {
                Arc::new(BearerTokenAuthenticator::new(token))
            } else {
                let url = credentials.icp4d_url.clone().ok_or_else(|| {
                    WatsonError::configuration("icp4d_url is required for SDK-managed ICP4D tokens")
                })?;
                let (username, password) = credentials.basic()?;
                Arc::new(TokenManagerAuthenticator::new(Icp4dTokenSource::new(
                    url, username, password, transport,
                )))
            }
        }
    };

    authenticator.validate()?;
    tracing::debug!(authentication_type = %auth_type, "Authenticator configured");
    Ok(authenticator)
}
