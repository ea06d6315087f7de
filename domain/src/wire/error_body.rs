//! Structured error payload for requests rejected before streaming

use serde::{Deserialize, Serialize};

/// `{ "error": "<message>" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Extract the message from a response body, if it is a non-empty error payload.
    pub fn parse_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| b.error)
            .filter(|e| !e.trim().is_empty())
    }
}
