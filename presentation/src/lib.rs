//! Presentation layer for html5-sentinel
//!
//! This crate contains CLI definitions, the HTTP relay server and the
//! console renderer for streamed reviews.

pub mod cli;
pub mod output;
pub mod server;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use output::console::{ConsoleRenderer, format_error, truncation_hint};
pub use server::{ApiError, AppState, router, serve};
