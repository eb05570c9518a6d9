//! Credential & header manager
//!
//! A [`Session`] holds the auth state of one client: the scheme, the current
//! token and its expiry, and the header set derived from them. Headers are
//! computed at construction and recomputed when the token rotates.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tradelink_domain::constants::{
    AUTH_TOKEN_FIELD, COMPATIBILITY_LEVEL, HEADER_APP_NAME, HEADER_CALL_NAME, HEADER_CERT_NAME,
    HEADER_COMPATIBILITY_LEVEL, HEADER_CONTENT_TYPE, HEADER_DEV_NAME, HEADER_IAF_TOKEN,
    HEADER_REQUEST_ENCODING, HEADER_SHOPPING_APP_ID, HEADER_SHOPPING_SITE_ID,
    HEADER_SHOPPING_VERSION, HEADER_SITE_ID, REQUESTER_CREDENTIALS, SHOPPING_API_VERSION,
    SHOPPING_CONTENT_TYPE, SHOPPING_URL, SITE_ID, TRADING_CONTENT_TYPE,
};
use tradelink_domain::{
    ApiError, AppCredential, AuthScheme, ClientConfig, Environment, Headers, Result,
};

use crate::tree::{merge_options, object, OptionsTree};

/// Per-client auth state
#[derive(Debug, Clone)]
pub struct Session {
    scheme: AuthScheme,
    environment: Environment,
    token: String,
    expires_at: Option<DateTime<Utc>>,
    app_credential: Option<AppCredential>,
    shopping_app_id: Option<String>,
    headers: Headers,
    trading_url: String,
    shopping_url: String,
}

impl Session {
    /// Create a session for `scheme`.
    ///
    /// # Errors
    /// - `ApiError::NoAuthToken` if `token` is empty
    /// - `ApiError::InvalidAppCredential` if the signed scheme is selected
    ///   without a complete app credential
    pub fn new(
        scheme: AuthScheme,
        environment: Environment,
        token: impl Into<String>,
        app_credential: Option<AppCredential>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ApiError::NoAuthToken);
        }

        let app_credential = match scheme {
            AuthScheme::SignedAppCredential => {
                let credential = app_credential.ok_or_else(|| {
                    ApiError::InvalidAppCredential("no app credential provided".to_string())
                })?;
                credential.validate()?;
                Some(credential)
            }
            AuthScheme::OAuthBearer => app_credential,
        };

        let headers = base_headers(scheme, &token, app_credential.as_ref());

        Ok(Self {
            scheme,
            environment,
            token,
            expires_at: None,
            app_credential,
            shopping_app_id: None,
            headers,
            trading_url: environment.trading_url().to_string(),
            shopping_url: SHOPPING_URL.to_string(),
        })
    }

    /// Create a session from string-typed configuration.
    ///
    /// Validation order follows construction: token, environment, auth
    /// scheme, then the app credential.
    ///
    /// # Errors
    /// Any construction error kind, see [`Session::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(ApiError::NoAuthToken);
        }
        let environment = config.environment()?;
        let scheme = config.auth_scheme()?;

        let mut session =
            Self::new(scheme, environment, config.token.clone(), config.app_config.clone())?;
        session.expires_at = config.expires_at;
        session.shopping_app_id = config.shopping_app_id.clone();
        Ok(session)
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_shopping_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.shopping_app_id = Some(app_id.into());
        self
    }

    /// Override the environment-determined endpoints (used against mock
    /// servers).
    pub fn with_endpoints(mut self, trading_url: impl Into<String>, shopping_url: impl Into<String>) -> Self {
        self.trading_url = trading_url.into();
        self.shopping_url = shopping_url.into();
        self
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn trading_url(&self) -> &str {
        &self.trading_url
    }

    pub fn shopping_url(&self) -> &str {
        &self.shopping_url
    }

    /// Fixed header set of this session, without the per-call name
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// True once `now` reaches the stored expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// # Errors
    /// Returns `ApiError::TokenExpired` when the token has expired at `now`.
    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<()> {
        match self.expires_at {
            Some(expired_at) if now >= expired_at => Err(ApiError::TokenExpired { expired_at }),
            _ => Ok(()),
        }
    }

    /// Requester-credential sub-tree carrying the current token
    pub fn credentials(&self) -> OptionsTree {
        object(json!({ REQUESTER_CREDENTIALS: { AUTH_TOKEN_FIELD: self.token } }))
    }

    /// Merge the requester credentials into `options` when the signed scheme
    /// is active. Bearer sessions leave the options untouched.
    pub fn inject_credentials(&self, options: &mut OptionsTree) {
        if self.scheme == AuthScheme::SignedAppCredential {
            merge_options(options, self.credentials());
        }
    }

    /// Headers for one Trading API call
    pub fn trading_headers(&self, operation: &str, extra: &Headers) -> Headers {
        let mut headers = Headers::new();
        headers.insert(HEADER_CALL_NAME.to_string(), operation.to_string());
        headers.extend(self.headers.iter().map(|(name, value)| (name.clone(), value.clone())));
        headers.extend(extra.iter().map(|(name, value)| (name.clone(), value.clone())));
        headers
    }

    /// Headers for one Shopping API call
    ///
    /// # Errors
    /// Returns `ApiError::InvalidAppCredential` when neither a shopping app id
    /// nor an app credential is configured.
    pub fn shopping_headers(&self, operation: &str, extra: &Headers) -> Result<Headers> {
        let app_id = self
            .shopping_app_id
            .as_deref()
            .or_else(|| self.app_credential.as_ref().map(|credential| credential.client_id.as_str()))
            .filter(|app_id| !app_id.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidAppCredential(format!("{operation} requires a shopping app id"))
            })?;

        let mut headers = Headers::new();
        for (name, value) in [
            (HEADER_CONTENT_TYPE, SHOPPING_CONTENT_TYPE),
            (HEADER_CALL_NAME, operation),
            (HEADER_SHOPPING_APP_ID, app_id),
            (HEADER_SHOPPING_SITE_ID, SITE_ID),
            (HEADER_SHOPPING_VERSION, SHOPPING_API_VERSION),
            (HEADER_REQUEST_ENCODING, "xml"),
        ] {
            headers.insert(name.to_string(), value.to_string());
        }
        headers.extend(extra.iter().map(|(name, value)| (name.clone(), value.clone())));
        Ok(headers)
    }

    /// Replace the token, keeping the current expiry.
    ///
    /// Only the auth-dependent header changes; requests built afterwards use
    /// the new token.
    ///
    /// # Errors
    /// Returns `ApiError::NoAuthToken` if `token` is empty.
    pub fn rotate_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ApiError::NoAuthToken);
        }
        if self.scheme == AuthScheme::OAuthBearer {
            self.headers.insert(HEADER_IAF_TOKEN.to_string(), bearer(&token));
        }
        self.token = token;
        Ok(())
    }

    /// Replace the token together with its expiry.
    ///
    /// # Errors
    /// Returns `ApiError::NoAuthToken` if `token` is empty.
    pub fn rotate_token_until(
        &mut self,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.rotate_token(token)?;
        self.expires_at = Some(expires_at);
        Ok(())
    }

    /// Requester-credential sub-tree as a value
    pub fn credentials_value(&self) -> Value {
        Value::Object(self.credentials())
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

fn base_headers(scheme: AuthScheme, token: &str, credential: Option<&AppCredential>) -> Headers {
    let mut headers = Headers::new();
    headers.insert(HEADER_CONTENT_TYPE.to_string(), TRADING_CONTENT_TYPE.to_string());
    headers.insert(HEADER_COMPATIBILITY_LEVEL.to_string(), COMPATIBILITY_LEVEL.to_string());
    headers.insert(HEADER_SITE_ID.to_string(), SITE_ID.to_string());

    match (scheme, credential) {
        (AuthScheme::SignedAppCredential, Some(credential)) => {
            headers.insert(HEADER_APP_NAME.to_string(), credential.client_id.clone());
            headers.insert(HEADER_DEV_NAME.to_string(), credential.dev_id.clone());
            headers.insert(HEADER_CERT_NAME.to_string(), credential.cert_id.clone());
        }
        (AuthScheme::SignedAppCredential, None) => {}
        (AuthScheme::OAuthBearer, _) => {
            headers.insert(HEADER_IAF_TOKEN.to_string(), bearer(token));
        }
    }
    headers
}
