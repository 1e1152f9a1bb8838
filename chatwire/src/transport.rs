//! HTTP transport seam.
//!
//! The transport opens a streaming request and hands back the raw body as a
//! byte stream. A non-success status fails here, before any part exists.

use async_trait::async_trait;
use bytes::Bytes;
use chatwire_core::TransportError;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

/// Boxed response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// A streaming POST request.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Endpoint URL.
    pub url: String,
    /// Extra headers (auth, versioning).
    pub headers: Vec<(String, String)>,
    /// JSON request body.
    pub body: serde_json::Value,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl StreamRequest {
    /// Create a request posting `body` to `url`.
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
            timeout: None,
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Opens streaming HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response body as a byte stream.
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, TransportError>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with a custom client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header("Content-Type", "application/json")
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let headers: HashMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
                .collect();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), url = %request.url, "Stream request failed");
            return Err(TransportError::status(status.as_u16(), body)
                .with_message(status.canonical_reason().unwrap_or("request failed"))
                .with_headers(headers));
        }

        tracing::debug!(url = %request.url, "Stream opened");
        Ok(Box::pin(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_open_streams_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data: [DONE]\n\n"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let request = StreamRequest::new(
            format!("{}/v1/chat", server.uri()),
            serde_json::json!({"stream": true}),
        )
        .bearer_auth("sk-test");

        let mut stream = transport.open(&request).await.unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_failure_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string(r#"{"error":{"message":"rate limited"}}"#),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let request = StreamRequest::new(server.uri(), serde_json::json!({}));
        let err = match transport.open(&request).await {
            Err(e) => e,
            Ok(_) => panic!("expected a transport error"),
        };

        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after, Some(7));
        assert!(err.body.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // nothing listens on port 9 locally
        let request = StreamRequest::new("http://127.0.0.1:9/", serde_json::json!({}))
            .timeout(Duration::from_secs(2));
        let err = match ReqwestTransport::new().open(&request).await {
            Err(e) => e,
            Ok(_) => panic!("expected a transport error"),
        };
        assert_eq!(err.status_code, None);
    }
}
