//! Configuration file loading for html5-sentinel
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SENTINEL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./sentinel.toml` or `./.sentinel.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/html5-sentinel/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileClientConfig, FileConfig, FileGeminiConfig, FileLimitsConfig,
    FileServerConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
