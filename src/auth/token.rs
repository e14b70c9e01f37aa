//! SDK-managed access tokens.
//!
//! A [`TokenSource`] knows how to exchange long-lived credentials for an
//! access token. [`TokenManagerAuthenticator`] caches that token and makes
//! sure that when it nears expiry exactly one caller performs the exchange
//! while the others wait for its result.

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use super::{
    basic_header_value, check_credential, set_authorization, AuthenticationType, Authenticator,
    AUTHORIZATION_HEADER,
};
use crate::errors::{WatsonError, WatsonResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Default IAM token endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Refresh a cached token once it is this close to expiring.
pub const DEFAULT_REFRESH_BUFFER: Duration = Duration::from_secs(60);

const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const IAM_DEFAULT_CLIENT_ID: &str = "bx";
const IAM_DEFAULT_CLIENT_SECRET: &str = "bx";
const ICP4D_TOKEN_PATH: &str = "/v1/preauth/validateAuth";

/// An exchanged access token and its expiry.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token. `expires_at` of `None` means it never expires.
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            expires_at,
        }
    }

    /// Expiry time, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// The token value.
    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    /// Returns true if the token is still usable `buffer` from now.
    pub fn is_fresh(&self, buffer: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => ChronoDuration::from_std(buffer)
                .ok()
                .and_then(|buffer| Utc::now().checked_add_signed(buffer))
                .is_some_and(|deadline| deadline < expires_at),
            None => true,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges configured credentials for an access token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Requests a new token from the token service.
    async fn fetch_token(&self) -> WatsonResult<AccessToken>;

    /// The authentication pattern this source serves.
    fn authentication_type(&self) -> AuthenticationType;

    /// Checks the configured credentials without touching the network.
    fn validate(&self) -> WatsonResult<()>;
}

/// Bearer authenticator backed by a cached, auto-refreshed token.
///
/// The fast path takes only a read lock. On a miss, callers queue on the
/// refresh mutex and re-check the cache once they hold it, so a burst of
/// requests racing an expiry produces a single `fetch_token` call.
pub struct TokenManagerAuthenticator<S> {
    source: S,
    cached: RwLock<Option<AccessToken>>,
    refresh_lock: Mutex<()>,
    refresh_buffer: Duration,
    refresh_count: AtomicU64,
}

impl<S: TokenSource> TokenManagerAuthenticator<S> {
    /// Creates a token manager around `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refresh_buffer: DEFAULT_REFRESH_BUFFER,
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Sets how long before expiry a token is considered stale.
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    /// Number of token exchanges performed so far.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Returns a valid token, refreshing it if needed.
    pub async fn token(&self) -> WatsonResult<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Whoever held the lock before us may already have refreshed.
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let fresh = self.source.fetch_token().await?;
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            authentication_type = %self.source.authentication_type(),
            expires_at = ?fresh.expires_at(),
            "Access token refreshed"
        );

        let value = fresh.secret().to_string();
        *self.cached.write().await = Some(fresh);
        Ok(value)
    }

    async fn cached_token(&self) -> Option<String> {
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_fresh(self.refresh_buffer))
            .map(|t| t.secret().to_string())
    }
}

#[async_trait]
impl<S: TokenSource> Authenticator for TokenManagerAuthenticator<S> {
    async fn authenticate(&self, headers: &mut HashMap<String, String>) -> WatsonResult<()> {
        let token = self.token().await?;
        set_authorization(headers, format!("Bearer {token}"));
        Ok(())
    }

    fn authentication_type(&self) -> AuthenticationType {
        self.source.authentication_type()
    }

    fn validate(&self) -> WatsonResult<()> {
        self.source.validate()
    }
}

impl<S> fmt::Debug for TokenManagerAuthenticator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManagerAuthenticator")
            .field("refresh_buffer", &self.refresh_buffer)
            .field("refresh_count", &self.refresh_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expiration: Option<i64>,
}

/// IBM Cloud IAM API-key token exchange.
pub struct IamTokenSource {
    apikey: SecretString,
    url: String,
    client_id: String,
    client_secret: SecretString,
    transport: Arc<dyn HttpTransport>,
}

impl IamTokenSource {
    /// Creates an IAM token source using the default IAM endpoint.
    pub fn new(apikey: SecretString, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            apikey,
            url: DEFAULT_IAM_URL.to_string(),
            client_id: IAM_DEFAULT_CLIENT_ID.to_string(),
            client_secret: SecretString::new(IAM_DEFAULT_CLIENT_SECRET.to_string()),
            transport,
        }
    }

    /// Overrides the IAM endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Overrides the client credentials sent to IAM.
    pub fn with_client_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: Option<SecretString>,
    ) -> Self {
        self.client_id = client_id.into();
        if let Some(secret) = client_secret {
            self.client_secret = secret;
        }
        self
    }

    fn form_body(&self) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", IAM_GRANT_TYPE)
            .append_pair("apikey", self.apikey.expose_secret())
            .append_pair("response_type", "cloud_iam")
            .finish()
            .into_bytes()
    }
}

#[async_trait]
impl TokenSource for IamTokenSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_token(&self) -> WatsonResult<AccessToken> {
        let request = HttpRequest::post(&self.url)
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_header("Accept", "application/json")
            .with_header(
                AUTHORIZATION_HEADER,
                basic_header_value(&self.client_id, self.client_secret.expose_secret()),
            )
            .with_body(self.form_body());

        let response = self.transport.send(request).await?;
        let parsed: IamTokenResponse = parse_token_response(&response)?;

        let expires_at = parsed
            .expiration
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| parsed.expires_in.and_then(expires_after))
            .or_else(|| jwt_expiration(&parsed.access_token));

        Ok(AccessToken::new(parsed.access_token, expires_at))
    }

    fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::Iam
    }

    fn validate(&self) -> WatsonResult<()> {
        check_credential("iam_apikey", self.apikey.expose_secret())
    }
}

impl fmt::Debug for IamTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamTokenSource")
            .field("url", &self.url)
            .field("apikey", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Icp4dTokenResponse {
    access_token: String,
    #[serde(default)]
    expiration: Option<i64>,
}

/// IBM Cloud Pak for Data token exchange.
pub struct Icp4dTokenSource {
    url: String,
    username: String,
    password: SecretString,
    transport: Arc<dyn HttpTransport>,
}

impl Icp4dTokenSource {
    /// Creates an ICP4D token source. `url` is the cluster base URL.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password,
            transport,
        }
    }

    fn token_url(&self) -> String {
        if self.url.ends_with(ICP4D_TOKEN_PATH) {
            self.url.clone()
        } else {
            format!("{}{}", self.url, ICP4D_TOKEN_PATH)
        }
    }
}

#[async_trait]
impl TokenSource for Icp4dTokenSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_token(&self) -> WatsonResult<AccessToken> {
        let request = HttpRequest::get(self.token_url())
            .with_header("Accept", "application/json")
            .with_header(
                AUTHORIZATION_HEADER,
                basic_header_value(&self.username, self.password.expose_secret()),
            );

        let response = self.transport.send(request).await?;
        let parsed: Icp4dTokenResponse = parse_token_response(&response)?;
        let expires_at = parsed
            .expiration
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| jwt_expiration(&parsed.access_token));

        Ok(AccessToken::new(parsed.access_token, expires_at))
    }

    fn authentication_type(&self) -> AuthenticationType {
        AuthenticationType::Icp4d
    }

    fn validate(&self) -> WatsonResult<()> {
        check_credential("username", &self.username)?;
        check_credential("password", self.password.expose_secret())
    }
}

impl fmt::Debug for Icp4dTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Icp4dTokenSource")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Token endpoint failures are authentication failures whatever the status.
fn parse_token_response<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> WatsonResult<T> {
    if !response.is_success() {
        let message = match WatsonError::from_response(response.status, &response.headers, &response.body) {
            WatsonError::Api { message, .. } | WatsonError::Authentication { message, .. } => message,
            other => other.to_string(),
        };
        return Err(WatsonError::Authentication {
            status: Some(response.status),
            message: format!("Token request failed: {message}"),
            body: Some(String::from_utf8_lossy(&response.body).into_owned()),
        });
    }

    response.json().map_err(|e| WatsonError::Authentication {
        status: Some(response.status),
        message: format!("Malformed token response: {e}"),
        body: Some(String::from_utf8_lossy(&response.body).into_owned()),
    })
}

/// Reads the `exp` claim of a JWT without verifying it.
/// Expiry `secs` from now; `None` when that is out of range.
fn expires_after(secs: i64) -> Option<DateTime<Utc>> {
    ChronoDuration::try_seconds(secs).and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
}

fn jwt_expiration(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    Utc.timestamp_opt(exp, 0).single()
}
