//! Relay limits: request size ceilings.
//!
//! [`RelayLimits`] groups the static thresholds the relay enforces before any
//! model call is made.

use serde::{Deserialize, Serialize};

/// 500 KiB aggregate across all files of a new review.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 500 * 1024;

/// Ceiling for the total text of a continuation history.
pub const DEFAULT_MAX_HISTORY_BYTES: usize = 2 * 1024 * 1024;

/// Worst-case growth of text once JSON-escaped (`\u00XX` for control bytes).
const JSON_ESCAPE_FACTOR: usize = 6;

/// Room for keys, roles and file names around the counted text.
const BODY_HEADROOM_BYTES: usize = 64 * 1024;

/// Size ceilings enforced by [`RelayReviewUseCase`](crate::use_cases::relay_review::RelayReviewUseCase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayLimits {
    /// Maximum combined file content of a new review, in bytes.
    pub max_input_bytes: usize,
    /// Maximum combined text of a continuation history, in bytes.
    pub max_history_bytes: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
        }
    }
}

impl RelayLimits {
    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    pub fn with_max_history_bytes(mut self, max: usize) -> Self {
        self.max_history_bytes = max;
        self
    }

    /// Largest encoded request body that can still carry text within both
    /// ceilings. Bodies above this are refused before parsing.
    pub fn max_body_bytes(&self) -> usize {
        self.max_input_bytes
            .max(self.max_history_bytes)
            .saturating_mul(JSON_ESCAPE_FACTOR)
            .saturating_add(BODY_HEADROOM_BYTES)
    }
}
