//! OAuth2 access tokens for service accounts (RFC 7523 JWT bearer grant).
//!
//! The provider signs a short-lived RS256 assertion with the service account
//! key, exchanges it at the key's `token_uri`, and caches the resulting
//! access token until shortly before it expires.

use std::time::Duration as StdDuration;

use jsonwebtoken::{Algorithm, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::credentials::ServiceAccountKey;
use crate::error::SheetsError;

/// Read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        self.expires_at - now > Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Hands out bearer tokens for one service account.
#[derive(Debug)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    http: Client,
    scope: String,
    timeout: Option<StdDuration>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            scope: SPREADSHEETS_SCOPE.to_string(),
            timeout: None,
            cached: Mutex::new(None),
        }
    }

    /// Overrides the requested OAuth scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Bounds each token exchange. The cache lock is held during the
    /// exchange, so without a timeout a stalled token endpoint stalls every
    /// caller.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<StdDuration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Returns a valid access token, exchanging a new assertion if needed.
    ///
    /// Concurrent callers wait on the same refresh rather than each hitting
    /// the token endpoint.
    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        let now = OffsetDateTime::now_utc();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let fresh = self.exchange(now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    /// Drops the cached token so the next call performs a new exchange.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    fn assertion(&self, now: OffsetDateTime) -> Result<String, SheetsError> {
        let iat = now.unix_timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email(),
            scope: &self.scope,
            aud: self.key.token_uri(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id().map(str::to_string);

        encode(&header, &claims, self.key.encoding_key())
            .map_err(|e| SheetsError::credentials(format!("cannot sign assertion: {e}")))
    }

    async fn exchange(&self, now: OffsetDateTime) -> Result<CachedToken, SheetsError> {
        let assertion = self.assertion(now)?;
        debug!(
            client_email = %self.key.client_email(),
            token_uri = %self.key.token_uri(),
            "Exchanging service account assertion for access token"
        );

        let mut request = self
            .http
            .post(self.key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())]);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SheetsError::auth(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SheetsError::auth(format!("cannot read token response: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(desc) => format!("{}: {desc}", err.error),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned {status}"),
            };
            warn!(status = %status, error = %message, "Token exchange rejected");
            return Err(SheetsError::auth(message));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SheetsError::auth(format!("malformed token response: {e}")))?;
        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds(lifetime),
        })
    }
}
