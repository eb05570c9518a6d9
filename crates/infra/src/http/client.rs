use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;
use tradelink_core::{OutboundRequest, Transport};
use tradelink_domain::{ApiError, Headers};

use crate::errors::InfraError;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("tradelink/", env!("CARGO_PKG_VERSION"));

/// HTTP client with timeout support. Requests are sent exactly once.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Transport` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    ///
    /// # Errors
    /// Returns `ApiError::Transport` on network failure. HTTP error statuses
    /// are returned as responses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let request = builder.build().map_err(|err| ApiError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                debug!(%method, %url, %status, "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    accept_invalid_certs: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            default_headers: None,
            accept_invalid_certs: false,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// # Errors
    /// Returns `ApiError::Transport` if the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient, ApiError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|err| ApiError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

/// Convert a computed header set into a reqwest header map.
///
/// # Errors
/// Returns `ApiError::InvalidHeader` when a name or value cannot be carried
/// in an HTTP header, e.g. a token containing a newline.
pub fn header_map(headers: &Headers) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(InfraError::from)?;
        let value = HeaderValue::from_str(value).map_err(InfraError::from)?;
        map.insert(name, value);
    }
    Ok(map)
}

/// [`Transport`] issuing requests through an [`HttpClient`]
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// # Errors
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, ApiError> {
        Ok(Self::new(HttpClient::new()?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<String, ApiError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|err| ApiError::Transport(format!("invalid method {}: {err}", request.method)))?;
        let headers = header_map(&request.headers)?;

        let builder = self.http.request(method, request.url.as_str()).headers(headers).body(request.body);
        let response = self.http.send(builder).await?;

        let response = response.error_for_status().map_err(InfraError::from)?;
        let body = response.text().await.map_err(InfraError::from)?;
        Ok(body)
    }
}
