//! # TradeLink Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - The quick-xml-backed XML codec
//! - Configuration loading (environment variables, JSON/TOML files)
//! - OAuth token issuance and notification envelope parsing
//!
//! ## Architecture
//! - Implements traits defined in `tradelink-core`
//! - Contains all "impure" code (network, filesystem, environment)

use std::sync::Arc;

use tracing::info;
use tradelink_core::TradingClient;
use tradelink_domain::{ClientConfig, Result};

pub mod config;
pub mod errors;
pub mod http;
pub mod identity;
pub mod notification;
pub mod xml;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpTransport};
pub use identity::{IdentityClient, IssuedToken};
pub use notification::parse_notification;
pub use xml::QuickXmlCodec;

/// Build a [`TradingClient`] wired to the HTTP transport and the quick-xml
/// codec.
///
/// # Errors
/// Any construction error kind, or `ApiError::Transport` when the HTTP
/// client cannot be initialised.
pub fn connect(config: &ClientConfig) -> Result<TradingClient> {
    let transport = HttpTransport::with_defaults()?;
    let client = TradingClient::from_config(config, Arc::new(transport), Arc::new(QuickXmlCodec::new()))?;
    info!(env = %config.env, auth_type = %config.auth_type, "trading client ready");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use tradelink_domain::{ApiErrorKind, AuthScheme, Environment};

    use super::*;

    #[test]
    fn connect_validates_configuration() {
        let err = connect(&ClientConfig::new("", AuthScheme::OAuthBearer, Environment::Sandbox))
            .unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::NoAuthToken);

        let client =
            connect(&ClientConfig::new("token", AuthScheme::OAuthBearer, Environment::Production))
                .unwrap();
        assert_eq!(client.session().trading_url(), "https://api.ebay.com/ws/api.dll");
    }
}
