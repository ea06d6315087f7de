//! Relay listener configuration from TOML (`[server]` section)

use serde::{Deserialize, Serialize};

/// Raw server configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    /// Socket address the relay listens on
    pub bind: String,
    /// Route of the review endpoint
    pub path: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            path: "/api/review".to_string(),
        }
    }
}
