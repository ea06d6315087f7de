//! LLM Gateway port
//!
//! Defines the interface for communicating with the hosted review model.

use async_trait::async_trait;
use sentinel_domain::{ConversationTurn, Model, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Missing API key: {0} not set")]
    MissingCredential(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transport closed")]
    TransportClosed,
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the model provider.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// The model sessions are opened against.
    fn model(&self) -> &Model;

    /// Open a conversation seeded with `history` (empty for a new review).
    ///
    /// Fails fast on configuration problems such as a missing credential;
    /// no network round trip happens here.
    async fn create_session(
        &self,
        history: &[ConversationTurn],
    ) -> Result<Box<dyn LlmSession>, GatewayError>;
}

/// Handle for receiving streaming events from an LLM session.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. Dropping the handle tells the
/// producer to stop pulling from the provider.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// An active LLM conversation
#[async_trait]
pub trait LlmSession: Send + Sync {
    /// Get the model used by this session
    fn model(&self) -> &Model;

    /// Send a user message and stream the model's answer.
    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError>;
}
