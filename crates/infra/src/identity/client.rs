//! Identity client
//!
//! Exchanges an authorization code or a refresh token for an access token
//! at the environment's identity endpoint. The resulting [`IssuedToken`]
//! feeds `Session::rotate_token_until` or a fresh `ClientConfig`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use tradelink_domain::constants::TOKEN_PATH;
use tradelink_domain::{ApiError, Environment, Result};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Token pair returned by the identity endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_token_expires_in: Option<i64>,
    pub token_type: String,
}

impl IssuedToken {
    /// Absolute expiry of the access token issued at `issued_at`
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at + Duration::seconds(self.expires_in)
    }

    /// Absolute expiry of the refresh token, when one was issued
    pub fn refresh_expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.refresh_token_expires_in.map(|seconds| issued_at + Duration::seconds(seconds))
    }
}

/// Client for the OAuth token endpoint
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: HttpClient,
    token_url: Url,
    credential: String,
    redirect_uri: String,
}

impl IdentityClient {
    /// # Errors
    /// Returns `ApiError::InvalidAppCredential` when the client id or cert id
    /// is empty.
    pub fn new(
        http: HttpClient,
        environment: Environment,
        client_id: &str,
        cert_id: &str,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        if client_id.trim().is_empty() || cert_id.trim().is_empty() {
            return Err(ApiError::InvalidAppCredential(
                "client id and cert id are required for token issuance".to_string(),
            ));
        }

        Ok(Self {
            http,
            token_url: token_url(environment.identity_url())?,
            credential: basic_credential(client_id, cert_id),
            redirect_uri: redirect_uri.into(),
        })
    }

    /// Point the client at another identity origin (used against mock
    /// servers).
    ///
    /// # Errors
    /// Returns `ApiError::Config` when `origin` is not a valid URL.
    pub fn with_origin(mut self, origin: &str) -> Result<Self> {
        self.token_url = token_url(origin)?;
        Ok(self)
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Exchange an authorization code for a token pair.
    ///
    /// # Errors
    /// Transport failures, non-2xx statuses and unreadable bodies.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<IssuedToken> {
        self.request_token("authorization_code", "code", code).await
    }

    /// Obtain a new access token from a refresh token.
    ///
    /// # Errors
    /// Transport failures, non-2xx statuses and unreadable bodies.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken> {
        self.request_token("refresh_token", "refresh_token", refresh_token).await
    }

    async fn request_token(&self, grant_type: &str, field: &str, value: &str) -> Result<IssuedToken> {
        let form = [("grant_type", grant_type), (field, value), ("redirect_uri", self.redirect_uri.as_str())];

        debug!(grant_type, url = %self.token_url, "requesting token");
        let builder = self
            .http
            .request(Method::POST, self.token_url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(AUTHORIZATION, &self.credential)
            .form(&form);

        let response = self.http.send(builder).await?.error_for_status().map_err(InfraError::from)?;
        let body = response.text().await.map_err(InfraError::from)?;
        let token: IssuedToken = serde_json::from_str(&body).map_err(InfraError::from)?;

        info!(grant_type, expires_in = token.expires_in, "token issued");
        Ok(token)
    }
}

/// `Basic base64(client_id:cert_id)`
pub fn basic_credential(client_id: &str, cert_id: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{client_id}:{cert_id}")))
}

fn token_url(origin: &str) -> Result<Url> {
    let base = Url::parse(origin)
        .map_err(|err| ApiError::Config(format!("invalid identity origin `{origin}`: {err}")))?;
    base.join(TOKEN_PATH)
        .map_err(|err| ApiError::Config(format!("invalid identity origin `{origin}`: {err}")))
}
