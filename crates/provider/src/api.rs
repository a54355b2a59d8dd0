//! REST API client for the provider's HTTP endpoints.
//!
//! Endpoints:
//! - `POST /v1/generations`              — submit a generation request
//! - `GET  /v1/operations/{id}`          — poll an operation
//! - `GET  <output url>?key=...`         — download the finished video
//!
//! Output URLs are time-limited and require the API key appended as a
//! query parameter; they are only valid shortly after the operation
//! completes.

use serde::Deserialize;

use crate::operation::{OperationHandle, OperationStatus};

/// HTTP client for the generative-video provider.
pub struct VideoApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// Provider-side generation parameters sent with every submission.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub duration_secs: u32,
    pub aspect_ratio: String,
}

/// Response returned by `POST /v1/generations` after queueing work.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    operation_id: String,
}

/// Errors from the provider REST layer.
#[derive(Debug, thiserror::Error)]
pub enum VideoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl VideoApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://api.provider.example`.
    /// * `api_key`  - Credential sent as the `x-api-key` header and
    ///   appended to output download URLs.
    /// * `model`    - Provider model identifier to generate with.
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    /// Submit a generation request, returning the operation handle.
    pub async fn submit(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<OperationHandle, VideoApiError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "duration_seconds": settings.duration_secs,
            "aspect_ratio": settings.aspect_ratio,
        });

        let response = self
            .client
            .post(format!("{}/v1/generations", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        tracing::debug!(operation_id = %submitted.operation_id, "Generation submitted");
        Ok(OperationHandle(submitted.operation_id))
    }

    /// Fetch the current state of an operation.
    ///
    /// Safe to call repeatedly; polling a terminal operation returns
    /// the same terminal payload.
    pub async fn check_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, VideoApiError> {
        let response = self
            .client
            .get(format!("{}/v1/operations/{}", self.base_url, handle))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download the finished video from its time-limited output URL.
    pub async fn download(&self, video_url: &str) -> Result<Vec<u8>, VideoApiError> {
        let url = with_key(video_url, &self.api_key);
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`VideoApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, VideoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VideoApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VideoApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Append the API key as a query parameter to an output URL.
fn with_key(url: &str, api_key: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}key={api_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_appended_with_question_mark() {
        assert_eq!(
            with_key("https://p.example/v/abc", "k1"),
            "https://p.example/v/abc?key=k1"
        );
    }

    #[test]
    fn key_appended_with_ampersand_when_query_exists() {
        assert_eq!(
            with_key("https://p.example/v/abc?ttl=60", "k1"),
            "https://p.example/v/abc?ttl=60&key=k1"
        );
    }
}
