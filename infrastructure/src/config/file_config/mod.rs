//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod client;
mod gemini;
mod limits;
mod server;

pub use client::FileClientConfig;
pub use gemini::FileGeminiConfig;
pub use limits::FileLimitsConfig;
pub use server::FileServerConfig;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("limits.{0} cannot be 0")]
    ZeroLimit(&'static str),

    #[error("server.bind '{0}' is not a socket address")]
    InvalidBind(String),

    #[error("server.path '{0}' must start with '/'")]
    InvalidPath(String),

    #[error("gemini.max_output_tokens cannot be 0")]
    ZeroMaxOutputTokens,

    #[error("gemini.model cannot be empty")]
    EmptyModelName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Relay listener settings
    pub server: FileServerConfig,
    /// Request size ceilings
    pub limits: FileLimitsConfig,
    /// Model provider settings
    pub gemini: FileGeminiConfig,
    /// Settings for the `review` command
    pub client: FileClientConfig,
}

impl FileConfig {
    /// Validate the entire configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.limits.max_input_bytes == 0 {
            return Err(ConfigValidationError::ZeroLimit("max_input_bytes"));
        }
        if self.limits.max_history_bytes == 0 {
            return Err(ConfigValidationError::ZeroLimit("max_history_bytes"));
        }
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigValidationError::InvalidBind(self.server.bind.clone()));
        }
        if !self.server.path.starts_with('/') {
            return Err(ConfigValidationError::InvalidPath(self.server.path.clone()));
        }
        if self.gemini.max_output_tokens == 0 {
            return Err(ConfigValidationError::ZeroMaxOutputTokens);
        }
        if self.gemini.model.as_str().trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        Ok(())
    }
}
