pub mod openai;

pub use openai::{OpenAiChatModel, OpenAiEmbedder};

use crate::config::EndpointSettings;
use crate::error::ProviderError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Authenticated JSON client for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub(crate) struct HttpEndpoint {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpEndpoint {
    pub(crate) fn new(settings: &EndpointSettings, timeout: Duration) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
            .map_err(|_| ProviderError::Configuration("api key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        for (name, value) in &settings.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|error| ProviderError::Configuration(format!("header {name}: {error}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|error| ProviderError::Configuration(format!("header {name}: {error}")))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub(crate) async fn post_json<B, T>(&self, operation: &str, path: &str, body: &B) -> Result<T, ProviderError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .json(body)
            .send()
            .await
            .map_err(|error| self.transport_error(operation, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| self.transport_error(operation, error))
    }

    fn transport_error(&self, operation: &str, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                operation: operation.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            ProviderError::Http(error)
        }
    }
}

/// Maps a failed provider response onto the error taxonomy, keeping the
/// provider's own message when it sends one.
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());
    let details = if message.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {message}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(details),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit(details),
        _ => ProviderError::Provider(details),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_an_authentication_error() {
        let error = error_for_status(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
        );
        assert!(error.is_authentication());
        assert!(error.to_string().contains("Incorrect API key provided"));
    }

    #[test]
    fn too_many_requests_is_a_rate_limit() {
        let error = error_for_status(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(error, ProviderError::RateLimit(ref details) if details.ends_with("slow down")));
    }

    #[test]
    fn other_failures_keep_provider_message() {
        let error = error_for_status(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(error, ProviderError::Provider(ref details) if details == "502 Bad Gateway"));
    }
}
