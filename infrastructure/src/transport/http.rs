//! HTTP transport posting review requests to a relay endpoint.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use sentinel_application::ports::review_transport::{
    ReviewTransport, TransportError, TransportResponse,
};
use sentinel_domain::{Framing, ReviewRequest};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ReviewTransport`] over HTTP using `reqwest`.
pub struct HttpReviewTransport {
    client: reqwest::Client,
    endpoint: String,
    framing: Framing,
}

impl HttpReviewTransport {
    pub fn new(endpoint: impl Into<String>, framing: Framing) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            framing,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReviewTransport for HttpReviewTransport {
    async fn send(&self, request: &ReviewRequest) -> Result<TransportResponse, TransportError> {
        debug!(
            endpoint = %self.endpoint,
            mode = request.mode(),
            framing = %self.framing,
            "Sending review request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, self.framing.content_type())
            .json(&request.to_body())
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "Relay responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(TransportResponse::Rejected {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let framing = Framing::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Body(e.to_string()))
            })
            .boxed();

        Ok(TransportResponse::Streaming { framing, body })
    }
}
