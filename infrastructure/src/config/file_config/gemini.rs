//! Model provider configuration from TOML (`[gemini]` section)

use crate::gemini::GeminiConfig;
use sentinel_domain::Model;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Raw Gemini configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API key given directly; takes precedence over `api_key_env`
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: Model,
    pub max_output_tokens: u32,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: Model::default(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl FileGeminiConfig {
    /// The API key from the config file, else from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn to_gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.resolve_api_key(),
            api_key_env: self.api_key_env.clone(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
        }
    }
}
