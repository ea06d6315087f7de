//! Terminal status of a model stream

use serde::{Deserialize, Serialize};

/// Reason the model stopped generating.
///
/// Only [`FinishReason::MaxTokens`] marks an answer as truncated; every
/// other reason is a final answer, even when the provider cut it short for
/// policy reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of response.
    Stop,
    /// Hit the output token limit; the answer can be continued.
    MaxTokens,
    /// Blocked by safety filters.
    Safety,
    /// Blocked for reciting training data.
    Recitation,
    /// Provider-specific reason.
    Other(String),
}

impl FinishReason {
    /// Map a provider finish-reason string (e.g. Gemini's `MAX_TOKENS`).
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "STOP" | "stop" | "end_turn" => FinishReason::Stop,
            "MAX_TOKENS" | "max_tokens" | "length" => FinishReason::MaxTokens,
            "SAFETY" | "safety" => FinishReason::Safety,
            "RECITATION" | "recitation" => FinishReason::Recitation,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, FinishReason::MaxTokens)
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::MaxTokens => write!(f, "max_tokens"),
            FinishReason::Safety => write!(f, "safety"),
            FinishReason::Recitation => write!(f, "recitation"),
            FinishReason::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Result of one relay invocation as seen by the consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    pub truncated: bool,
}
