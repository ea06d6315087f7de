//! Gemini implementation of the LLM gateway

use super::GeminiConfig;
use super::session::GeminiSession;
use async_trait::async_trait;
use sentinel_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use sentinel_domain::{ConversationTurn, Model};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway opening Gemini sessions over a shared HTTP client.
pub struct GeminiGateway {
    client: reqwest::Client,
    config: Arc<GeminiConfig>,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        info!(
            model = %config.model,
            credential = config.api_key.is_some(),
            "Gemini gateway initialized"
        );

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    fn model(&self) -> &Model {
        &self.config.model
    }

    async fn create_session(
        &self,
        history: &[ConversationTurn],
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| GatewayError::MissingCredential(self.config.api_key_env.clone()))?;

        Ok(Box::new(GeminiSession::new(
            self.client.clone(),
            self.config.clone(),
            api_key,
            history.to_vec(),
        )))
    }
}
