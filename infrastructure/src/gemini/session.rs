//! Gemini LLM session implementation
//!
//! Manages conversation history locally since the API is stateless.

use super::GeminiConfig;
use super::protocol::{self, GenerateContentRequest, GenerationConfig};
use async_trait::async_trait;
use futures::StreamExt;
use sentinel_application::ports::llm_gateway::{GatewayError, LlmSession, StreamHandle};
use sentinel_domain::{ConversationTurn, Model, StreamEvent};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 64;
const MAX_LINE_BYTES: usize = 1024 * 1024;

pub struct GeminiSession {
    client: reqwest::Client,
    config: Arc<GeminiConfig>,
    api_key: String,
    /// Conversation log (stateless API requires full history each call)
    log: Arc<Mutex<Vec<ConversationTurn>>>,
}

impl GeminiSession {
    pub fn new(
        client: reqwest::Client,
        config: Arc<GeminiConfig>,
        api_key: String,
        history: Vec<ConversationTurn>,
    ) -> Self {
        Self {
            client,
            config,
            api_key,
            log: Arc::new(Mutex::new(history)),
        }
    }

    /// Snapshot of the conversation log.
    pub async fn log(&self) -> Vec<ConversationTurn> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl LlmSession for GeminiSession {
    fn model(&self) -> &Model {
        &self.config.model
    }

    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let contents = {
            let mut log = self.log.lock().await;
            log.push(ConversationTurn::user(content));
            log.clone()
        };

        let body = GenerateContentRequest {
            contents: &contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        debug!(
            model = %self.config.model,
            turns = contents.len(),
            "Calling Gemini streamGenerateContent"
        );

        let response = self
            .client
            .post(self.config.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = protocol::error_message(&text).unwrap_or_else(|| status.to_string());
            warn!(status = status.as_u16(), "Gemini rejected the request");
            return Err(GatewayError::RequestFailed(format!(
                "{} (HTTP {})",
                message,
                status.as_u16()
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(pump(response, tx, self.log.clone()));
        Ok(StreamHandle::new(rx))
    }
}

/// Read SSE lines until a terminal event, the end of the body, or the
/// receiver goes away. A completed answer is appended to the log.
async fn pump(
    response: reqwest::Response,
    tx: mpsc::Sender<StreamEvent>,
    log: Arc<Mutex<Vec<ConversationTurn>>>,
) {
    let bytes = response
        .bytes_stream()
        .map(|r| r.map_err(std::io::Error::other));
    let mut lines = FramedRead::new(
        StreamReader::new(bytes),
        LinesCodec::new_with_max_length(MAX_LINE_BYTES),
    );

    let mut answer = String::new();
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::Error(format!("Failed to read model stream: {}", e)))
                    .await;
                return;
            }
        };

        for event in protocol::parse_sse_line(&line) {
            if let Some(text) = event.text() {
                answer.push_str(text);
            }
            let terminal = event.is_terminal();
            let completed = matches!(event, StreamEvent::Completed(_));

            if tx.send(event).await.is_err() {
                debug!("Stream receiver dropped, closing model stream");
                return;
            }
            if terminal {
                if completed {
                    log.lock().await.push(ConversationTurn::model(answer));
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use sentinel_domain::{ConversationHistory, FinishReason, Role};

    const SSE_BODY: &str = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hello \"}],\"role\":\"model\"}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"world\"}],\"role\":\"model\"},\"finishReason\":\"MAX_TOKENS\"}]}\r\n\r\n",
    );

    async fn fake_gemini(headers: HeaderMap, body: String) -> axum::response::Response {
        if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return (
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#,
            )
                .into_response();
        }
        if !body.contains("\"maxOutputTokens\":128") {
            return (StatusCode::UNPROCESSABLE_ENTITY, "missing generationConfig").into_response();
        }
        ([(header::CONTENT_TYPE, "text/event-stream")], SSE_BODY).into_response()
    }

    async fn serve() -> String {
        let app = Router::new().route("/v1beta/models/:action", post(fake_gemini));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn session(base_url: String, api_key: &str, history: Vec<ConversationTurn>) -> GeminiSession {
        let config = GeminiConfig {
            api_key: Some(api_key.to_string()),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url,
            model: Model::Gemini25Flash,
            max_output_tokens: 128,
        };
        GeminiSession::new(
            reqwest::Client::new(),
            Arc::new(config),
            api_key.to_string(),
            history,
        )
    }

    #[tokio::test]
    async fn test_streams_deltas_and_finish_reason() {
        let session = session(serve().await, "test-key", Vec::new());

        let mut handle = session.send_streaming("review this").await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = handle.recv().await {
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hello ".to_string()),
                StreamEvent::Delta("world".to_string()),
                StreamEvent::Completed(FinishReason::MaxTokens),
            ]
        );
    }

    #[tokio::test]
    async fn test_log_keeps_seed_message_and_answer() {
        let history = ConversationHistory::for_review("P", "partial").into_turns();
        let session = session(serve().await, "test-key", history);

        let mut handle = session.send_streaming("continue").await.unwrap();
        while handle.recv().await.is_some() {}

        let log = session.log().await;
        assert_eq!(log.len(), 4);
        assert_eq!(log[2], ConversationTurn::user("continue"));
        assert_eq!(log[3].role, Role::Model);
        assert_eq!(log[3].text(), "Hello world");
    }

    #[tokio::test]
    async fn test_api_error_is_request_failed() {
        let session = session(serve().await, "wrong-key", Vec::new());

        let err = session.send_streaming("review this").await.err().unwrap();

        assert_eq!(
            err,
            GatewayError::RequestFailed("API key not valid. (HTTP 400)".to_string())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let session = session("http://127.0.0.1:1".to_string(), "test-key", Vec::new());

        let err = session.send_streaming("review this").await.err().unwrap();

        assert!(matches!(err, GatewayError::ConnectionError(_)));
    }
}
