//! Review transport port
//!
//! The client side of the relay: sends a review request and hands back the
//! response body as a stream of byte chunks.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sentinel_domain::{Framing, ReviewRequest};
use thiserror::Error;

/// Errors raised by the transport itself (not by the model).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Incrementally readable response body.
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// What the relay answered.
pub enum TransportResponse {
    /// 2xx: the body is the relayed review.
    Streaming { framing: Framing, body: BodyStream },
    /// Non-success status; `body` is read in full.
    Rejected {
        status: u16,
        status_text: String,
        body: String,
    },
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportResponse::Streaming { framing, .. } => f
                .debug_struct("Streaming")
                .field("framing", framing)
                .finish_non_exhaustive(),
            TransportResponse::Rejected {
                status,
                status_text,
                body,
            } => f
                .debug_struct("Rejected")
                .field("status", status)
                .field("status_text", status_text)
                .field("body", body)
                .finish(),
        }
    }
}

/// Transport used by the stream consumer.
#[async_trait]
pub trait ReviewTransport: Send + Sync {
    /// Send `request` to the relay and return once response headers arrive.
    async fn send(&self, request: &ReviewRequest) -> Result<TransportResponse, TransportError>;
}
