//! Gemini adapter
//!
//! Talks to the hosted model through the `streamGenerateContent` endpoint in
//! server-sent-events mode. The API is stateless, so each session keeps its
//! own conversation log and resends it with every message.
//!
//! # Architecture
//!
//! ```text
//! GeminiGateway ──create_session(history)──► GeminiSession
//!                                                │ send_streaming(message)
//!                                                ▼
//!                     POST {base}/v1beta/models/{model}:streamGenerateContent?alt=sse
//!                                                │ data: {...}\n\n
//!                                                ▼
//!                         protocol::events() ──► StreamEvent (mpsc)
//! ```

pub mod gateway;
pub mod protocol;
pub mod session;

use sentinel_domain::Model;

/// Resolved connection settings for the Gemini API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// `None` when no key was configured; sessions then fail to open.
    pub api_key: Option<String>,
    /// Where the key was expected, for error messages.
    pub api_key_env: String,
    pub base_url: String,
    pub model: Model,
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    /// Streaming endpoint for `model`.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

pub use gateway::GeminiGateway;
pub use session::GeminiSession;
