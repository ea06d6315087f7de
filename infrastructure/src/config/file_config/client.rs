//! Review client configuration from TOML (`[client]` section)

use sentinel_domain::Framing;
use serde::{Deserialize, Serialize};

/// Raw client configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClientConfig {
    /// Relay endpoint URL
    pub endpoint: String,
    /// Framing requested from the relay
    pub framing: Framing,
    /// Continuations requested automatically after a truncated answer
    pub auto_continue: u32,
}

impl Default for FileClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/review".to_string(),
            framing: Framing::default(),
            auto_continue: 0,
        }
    }
}
