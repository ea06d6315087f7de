//! Relay review use case.
//!
//! The server side of the pipeline: validates a [`ReviewRequest`], opens a
//! model conversation and forwards every increment of the answer as a
//! [`RelayFrame`] the moment it arrives.
//!
//! Failures split in two:
//! - before streaming (validation, configuration) → [`RelayError`], no stream
//! - after streaming started → an in-band [`RelayFrame::Error`], stream closes normally

use crate::config::RelayLimits;
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use sentinel_domain::util::truncate_str;
use sentinel_domain::{
    DomainError, PromptTemplate, RelayFrame, ReviewRequest, StreamEvent, total_content_bytes,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const FRAME_BUFFER: usize = 32;

/// Errors that reject a relay request before any stream is opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("{0}")]
    InvalidRequest(#[from] DomainError),

    #[error("Combined file content is {size} bytes, exceeding the {limit}-byte limit.")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Conversation history is {size} bytes, exceeding the {limit}-byte limit.")]
    HistoryTooLarge { size: usize, limit: usize },

    #[error("Server configuration error. {0}")]
    Configuration(String),

    #[error("An internal error occurred: {0}")]
    Gateway(GatewayError),
}

impl From<GatewayError> for RelayError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::MissingCredential(_) => RelayError::Configuration(
                "The API key is missing.".to_string(),
            ),
            other => RelayError::Gateway(other),
        }
    }
}

/// Frames of one relayed review, in write order.
pub struct RelayStream {
    pub receiver: mpsc::Receiver<RelayFrame>,
}

impl RelayStream {
    pub async fn next(&mut self) -> Option<RelayFrame> {
        self.receiver.recv().await
    }
}

/// Use case for relaying a streamed review.
#[derive(Clone)]
pub struct RelayReviewUseCase {
    gateway: Arc<dyn LlmGateway>,
    limits: RelayLimits,
}

impl RelayReviewUseCase {
    pub fn new(gateway: Arc<dyn LlmGateway>, limits: RelayLimits) -> Self {
        Self { gateway, limits }
    }

    pub fn limits(&self) -> &RelayLimits {
        &self.limits
    }

    /// Check size ceilings. New reviews are bounded by the combined file
    /// content; continuations by the total text of their history.
    pub fn validate(&self, request: &ReviewRequest) -> Result<(), RelayError> {
        match request {
            ReviewRequest::New { files, .. } => {
                let size = total_content_bytes(files);
                if size > self.limits.max_input_bytes {
                    return Err(RelayError::PayloadTooLarge {
                        size,
                        limit: self.limits.max_input_bytes,
                    });
                }
            }
            ReviewRequest::Continue { history } => {
                let size = history.total_text_bytes();
                if size > self.limits.max_history_bytes {
                    return Err(RelayError::HistoryTooLarge {
                        size,
                        limit: self.limits.max_history_bytes,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate `request`, open the model conversation and start forwarding.
    ///
    /// Returns once the model session exists; the answer is then read from
    /// the returned [`RelayStream`].
    pub async fn start(&self, request: ReviewRequest) -> Result<RelayStream, RelayError> {
        self.validate(&request)?;

        let mode = request.mode();
        let (history, message) = match request {
            ReviewRequest::New { files, language } => {
                let prompt = PromptTemplate::build_prompt(&files, language);
                info!(
                    files = files.len(),
                    language = %language,
                    prompt_bytes = prompt.len(),
                    "Starting review"
                );
                (Vec::new(), prompt)
            }
            ReviewRequest::Continue { history } => {
                info!(
                    turns = history.len(),
                    history_bytes = history.total_text_bytes(),
                    "Continuing review"
                );
                (
                    history.into_turns(),
                    PromptTemplate::continuation_instruction().to_string(),
                )
            }
        };

        let session = self.gateway.create_session(&history).await?;
        debug!(model = %session.model(), mode, "Model session created");

        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        tokio::spawn(forward(session, message, tx));

        Ok(RelayStream { receiver: rx })
    }
}

/// Pump model events into relay frames until the model finishes, fails, or
/// the reader goes away.
async fn forward(session: Box<dyn LlmSession>, message: String, tx: mpsc::Sender<RelayFrame>) {
    let mut handle = match session.send_streaming(&message).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Failed to open model stream: {}", e);
            let _ = tx.send(RelayFrame::Error(e.to_string())).await;
            return;
        }
    };

    let mut forwarded = 0usize;
    while let Some(event) = handle.recv().await {
        match event {
            StreamEvent::Delta(text) => {
                if text.is_empty() {
                    continue;
                }
                forwarded += text.len();
                if tx.send(RelayFrame::Content(text)).await.is_err() {
                    info!(forwarded, "Client disconnected, abandoning model stream");
                    return;
                }
            }
            StreamEvent::Completed(reason) => {
                let truncated = reason.is_truncated();
                info!(finish = %reason, truncated, forwarded, "Model stream completed");
                if truncated {
                    let _ = tx.send(RelayFrame::Truncated).await;
                }
                let _ = tx.send(RelayFrame::Done).await;
                return;
            }
            StreamEvent::Error(message) => {
                warn!(forwarded, "Generation failed: {}", truncate_str(&message, 200));
                let _ = tx.send(RelayFrame::Error(message)).await;
                return;
            }
        }
    }

    debug!(forwarded, "Model stream closed without a finish reason");
    let _ = tx.send(RelayFrame::Done).await;
}
