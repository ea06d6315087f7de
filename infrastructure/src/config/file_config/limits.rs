//! Size ceilings from TOML (`[limits]` section)

use sentinel_application::RelayLimits;
use sentinel_application::config::relay_limits::{
    DEFAULT_MAX_HISTORY_BYTES, DEFAULT_MAX_INPUT_BYTES,
};
use serde::{Deserialize, Serialize};

/// Raw limits configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    /// Combined file content ceiling for a new review, in bytes
    pub max_input_bytes: usize,
    /// Total history text ceiling for a continuation, in bytes
    pub max_history_bytes: usize,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_history_bytes: DEFAULT_MAX_HISTORY_BYTES,
        }
    }
}

impl FileLimitsConfig {
    pub fn to_relay_limits(&self) -> RelayLimits {
        RelayLimits {
            max_input_bytes: self.max_input_bytes,
            max_history_bytes: self.max_history_bytes,
        }
    }
}
