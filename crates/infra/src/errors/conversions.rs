//! Conversions from external infrastructure errors into domain errors.

use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use reqwest::Error as HttpError;
use tradelink_domain::ApiError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ApiError);

impl From<InfraError> for ApiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ApiError> for InfraError {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoApiError {
    fn into_api_error(self) -> ApiError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError */
/* -------------------------------------------------------------------------- */

impl IntoApiError for HttpError {
    fn into_api_error(self) -> ApiError {
        if self.is_timeout() {
            return ApiError::Transport("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ApiError::Transport("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return ApiError::Transport(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        if self.is_decode() {
            return ApiError::Decode(format!("response body could not be read: {self}"));
        }

        ApiError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_api_error())
    }
}

/* -------------------------------------------------------------------------- */
/* header construction → ApiError */
/* -------------------------------------------------------------------------- */

impl From<InvalidHeaderName> for InfraError {
    fn from(value: InvalidHeaderName) -> Self {
        Self(ApiError::InvalidHeader(format!("invalid header name: {value}")))
    }
}

impl From<InvalidHeaderValue> for InfraError {
    fn from(value: InvalidHeaderValue) -> Self {
        Self(ApiError::InvalidHeader(format!("invalid header value: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* XML, serialization and I/O → ApiError */
/* -------------------------------------------------------------------------- */

impl From<quick_xml::Error> for InfraError {
    fn from(value: quick_xml::Error) -> Self {
        Self(ApiError::Decode(format!("malformed XML: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(ApiError::Decode(format!("invalid JSON: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        Self(ApiError::Config(format!("invalid TOML: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(ApiError::Config(format!("I/O error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use reqwest::{Client, StatusCode};
    use tradelink_domain::ApiErrorKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn http_status_503_maps_to_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(StatusCode::SERVICE_UNAVAILABLE))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.post(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: ApiError = InfraError::from(error).into();
        assert_eq!(mapped.kind(), ApiErrorKind::Transport);
        assert!(mapped.to_string().contains("503"));
    }

    #[test]
    fn bad_header_value_maps_to_invalid_header() {
        let err = HeaderValue::from_str("Bearer bad\ntoken").unwrap_err();
        let mapped: ApiError = InfraError::from(err).into();
        assert_eq!(mapped.kind(), ApiErrorKind::InvalidHeader);
    }

    #[test]
    fn io_error_maps_to_config_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let mapped: ApiError = InfraError::from(err).into();
        assert_eq!(mapped.kind(), ApiErrorKind::Config);
    }

    #[test]
    fn toml_error_maps_to_config_error() {
        let err = toml::from_str::<toml::Table>("token = ").unwrap_err();
        let mapped: ApiError = InfraError::from(err).into();
        assert_eq!(mapped.kind(), ApiErrorKind::Config);
    }
}
