//! Infrastructure layer for html5-sentinel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gemini;
pub mod transport;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileClientConfig, FileConfig, FileGeminiConfig,
    FileLimitsConfig, FileServerConfig,
};
pub use gemini::{GeminiConfig, GeminiGateway, GeminiSession};
pub use transport::HttpReviewTransport;
