//! Client configuration structures
//!
//! `ClientConfig` mirrors what a caller supplies to build a client. The
//! environment and auth type are kept as strings so that configuration files
//! and environment variables are validated in one place, at construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::types::{AppCredential, AuthScheme, Environment};

/// Configuration for a trading client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Auth token (bearer token or embedded requester token)
    #[serde(default)]
    pub token: String,
    /// `OAUTH` or `AUTHNAUTH`
    pub auth_type: String,
    /// Token expiry; `None` means the expiry is unknown and never checked
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// `sandbox` or `production`
    pub env: String,
    /// Required by the `AUTHNAUTH` scheme
    #[serde(default)]
    pub app_config: Option<AppCredential>,
    /// App id for Shopping API calls; falls back to `app_config.client_id`
    #[serde(default)]
    pub shopping_app_id: Option<String>,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>, auth_type: AuthScheme, env: Environment) -> Self {
        Self {
            token: token.into(),
            auth_type: auth_type.to_string(),
            expires_at: None,
            env: env.to_string(),
            app_config: None,
            shopping_app_id: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_app_credential(mut self, credential: AppCredential) -> Self {
        self.app_config = Some(credential);
        self
    }

    pub fn with_shopping_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.shopping_app_id = Some(app_id.into());
        self
    }

    /// Parsed environment
    ///
    /// # Errors
    /// Returns `ApiError::UnsupportedEnvironment` for unknown values.
    pub fn environment(&self) -> Result<Environment> {
        Environment::parse(&self.env)
    }

    /// Parsed auth scheme
    ///
    /// # Errors
    /// Returns `ApiError::UnsupportedAuthScheme` for unknown values.
    pub fn auth_scheme(&self) -> Result<AuthScheme> {
        AuthScheme::parse(&self.auth_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_round_trips_enums() {
        let config = ClientConfig::new("token", AuthScheme::SignedAppCredential, Environment::Sandbox);

        assert_eq!(config.auth_type, "authnauth");
        assert_eq!(config.environment().unwrap(), Environment::Sandbox);
        assert_eq!(config.auth_scheme().unwrap(), AuthScheme::SignedAppCredential);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "token": "TOKEN",
            "auth_type": "AUTHNAUTH",
            "env": "production",
            "expires_at": "2030-01-01T00:00:00Z",
            "app_config": { "client_id": "app", "dev_id": "dev", "cert_id": "cert" }
        }"#;

        let config: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.token, "TOKEN");
        assert_eq!(config.app_config.unwrap().dev_id, "dev");
        assert!(config.expires_at.is_some());
        assert!(config.shopping_app_id.is_none());
    }
}
