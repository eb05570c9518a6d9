//! Session value types: environment, auth scheme and app identity

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    PRODUCTION_IDENTITY_URL, PRODUCTION_TRADING_URL, SANDBOX_IDENTITY_URL, SANDBOX_TRADING_URL,
};
use crate::errors::{ApiError, Result};
use crate::impl_wire_enum_conversions;

/// Remote environment a client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl_wire_enum_conversions!(Environment {
    Sandbox => "sandbox",
    Production => "production",
});

impl Environment {
    /// Parse a configured environment name
    ///
    /// # Errors
    /// Returns `ApiError::UnsupportedEnvironment` for anything other than
    /// `sandbox` or `production`.
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(ApiError::UnsupportedEnvironment)
    }

    /// Trading API endpoint for this environment
    pub fn trading_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_TRADING_URL,
            Self::Production => PRODUCTION_TRADING_URL,
        }
    }

    /// Identity (OAuth token) origin for this environment
    pub fn identity_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_IDENTITY_URL,
            Self::Production => PRODUCTION_IDENTITY_URL,
        }
    }
}

/// Authentication scheme selected at client construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthScheme {
    /// Single rotating token sent as an authorization header
    OAuthBearer,
    /// App identity headers plus a token embedded in every request body
    SignedAppCredential,
}

impl_wire_enum_conversions!(AuthScheme {
    OAuthBearer => "oauth" | "oauth_bearer" | "bearer",
    SignedAppCredential => "authnauth" | "signed_app_credential",
});

impl AuthScheme {
    /// Parse a configured auth type
    ///
    /// # Errors
    /// Returns `ApiError::UnsupportedAuthScheme` for unrecognized values.
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(ApiError::UnsupportedAuthScheme)
    }
}

/// App identity trio required by the signed-credential scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredential {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub dev_id: String,
    #[serde(default)]
    pub cert_id: String,
}

impl AppCredential {
    pub fn new(
        client_id: impl Into<String>,
        dev_id: impl Into<String>,
        cert_id: impl Into<String>,
    ) -> Self {
        Self { client_id: client_id.into(), dev_id: dev_id.into(), cert_id: cert_id.into() }
    }

    /// Ensure every identity value is present
    ///
    /// # Errors
    /// Returns `ApiError::InvalidAppCredential` naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        let fields =
            [("client_id", &self.client_id), ("dev_id", &self.dev_id), ("cert_id", &self.cert_id)];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ApiError::InvalidAppCredential(format!("{name} is empty"))),
            None => Ok(()),
        }
    }
}
