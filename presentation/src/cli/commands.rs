//! CLI command definitions

use clap::{Parser, Subcommand};
use sentinel_domain::{Framing, Language};
use std::path::PathBuf;

/// CLI arguments for html5-sentinel
#[derive(Parser, Debug)]
#[command(name = "html5-sentinel")]
#[command(author, version, about = "Streaming HTML5 code reviews")]
#[command(long_about = r#"
HTML5 Sentinel reviews HTML, CSS and JavaScript files for zero-dependency,
performance, SEO & accessibility, security and EU AI Act transparency.

The relay (`serve`) forwards a hosted model's answer as it is generated; the
client (`review`) streams it to the terminal and can resume answers that hit
the model's output length limit.

Configuration files are loaded from (in priority order):
1. SENTINEL_* environment variables (nested keys with __)
2. --config <path>     Explicit config file
3. ./sentinel.toml     Project-level config
4. ~/.config/html5-sentinel/config.toml   Global config

Example:
  GEMINI_API_KEY=... html5-sentinel serve
  html5-sentinel review index.html style.css --language es
  html5-sentinel review index.html --auto-continue 2
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the streaming relay
    Serve {
        /// Socket address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Review files through a relay and stream the result
    Review {
        /// Files to review, in order
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Language of the review (en, es)
        #[arg(short, long, default_value = "en")]
        language: Language,

        /// Relay endpoint (overrides client.endpoint)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,

        /// Response framing to request (inline, ndjson)
        #[arg(long)]
        framing: Option<Framing>,

        /// Continue a truncated review up to N times (overrides client.auto_continue)
        #[arg(long, value_name = "N")]
        auto_continue: Option<u32>,

        /// Suppress the progress spinner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Print the exact prompt a review would send
    Prompt {
        /// Files to include, in order
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Language of the review (en, es)
        #[arg(short, long, default_value = "en")]
        language: Language,
    },

    /// Show configuration file locations and the effective configuration
    ShowConfig,
}
