//! Gemini `generateContent` wire types.
//!
//! Requests reuse the domain [`ConversationTurn`] shape (`{role, parts:[{text}]}`),
//! which matches the API's `Content` object. Responses arrive as one JSON
//! object per SSE `data:` line.

use sentinel_domain::{ConversationTurn, FinishReason, StreamEvent};
use serde::{Deserialize, Serialize};

/// Request body for `streamGenerateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: &'a [ConversationTurn],
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
}

/// One streamed response chunk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Error object, both in non-2xx bodies and in-stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Non-2xx response body: `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

/// Extract a readable message from a failed response body.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|r| r.error.message)
        .filter(|m| !m.is_empty())
}

/// Payload of an SSE line, if it carries data.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:")
        .map(str::trim_start)
        .filter(|data| !data.is_empty() && *data != "[DONE]")
}

impl GenerateContentResponse {
    /// Translate this chunk into stream events, text first.
    pub fn events(&self) -> Vec<StreamEvent> {
        if let Some(error) = &self.error {
            return vec![StreamEvent::Error(error.message.clone())];
        }
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return vec![StreamEvent::Error(format!("Prompt blocked: {}", reason))];
        }

        let mut events = Vec::new();
        let Some(candidate) = self.candidates.first() else {
            return events;
        };

        if let Some(content) = &candidate.content {
            let text: String = content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            if !text.is_empty() {
                events.push(StreamEvent::Delta(text));
            }
        }

        if let Some(reason) = &candidate.finish_reason {
            events.push(StreamEvent::Completed(FinishReason::from_provider(reason)));
        }

        events
    }
}

/// Parse one SSE line into stream events.
pub fn parse_sse_line(line: &str) -> Vec<StreamEvent> {
    let Some(data) = sse_data(line) else {
        return Vec::new();
    };
    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(chunk) => chunk.events(),
        Err(e) => vec![StreamEvent::Error(format!(
            "Invalid response from model: {}",
            e
        ))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_domain::ConversationHistory;

    #[test]
    fn test_request_body_shape() {
        let history = ConversationHistory::for_review("P", "partial");
        let body = GenerateContentRequest {
            contents: history.turns(),
            generation_config: GenerationConfig {
                max_output_tokens: 8192,
            },
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "P"}]},
                    {"role": "model", "parts": [{"text": "partial"}]}
                ],
                "generationConfig": {"maxOutputTokens": 8192}
            })
        );
    }

    #[test]
    fn test_text_chunk() {
        let events = parse_sse_line(
            r###"data: {"candidates":[{"content":{"parts":[{"text":"## Overall"},{"text":" Score"}],"role":"model"},"index":0}]}"###,
        );
        assert_eq!(events, vec![StreamEvent::Delta("## Overall Score".to_string())]);
    }

    #[test]
    fn test_final_chunk_with_max_tokens() {
        let events = parse_sse_line(
            r#"data: {"candidates":[{"content":{"parts":[{"text":"cut"}]},"finishReason":"MAX_TOKENS"}],"usageMetadata":{"totalTokenCount":9}}"#,
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("cut".to_string()),
                StreamEvent::Completed(FinishReason::MaxTokens),
            ]
        );
    }

    #[test]
    fn test_finish_without_text() {
        let events = parse_sse_line(r#"data: {"candidates":[{"finishReason":"STOP"}]}"#);
        assert_eq!(events, vec![StreamEvent::Completed(FinishReason::Stop)]);
    }

    #[test]
    fn test_blocked_prompt() {
        let events = parse_sse_line(r#"data: {"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert_eq!(
            events,
            vec![StreamEvent::Error("Prompt blocked: SAFETY".to_string())]
        );
    }

    #[test]
    fn test_in_stream_error() {
        let events = parse_sse_line(
            r#"data: {"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#,
        );
        assert_eq!(
            events,
            vec![StreamEvent::Error("The model is overloaded.".to_string())]
        );
    }

    #[test]
    fn test_non_data_lines_are_ignored() {
        assert!(parse_sse_line("").is_empty());
        assert!(parse_sse_line(": keep-alive").is_empty());
        assert!(parse_sse_line("event: message").is_empty());
    }

    #[test]
    fn test_malformed_data_is_an_error() {
        let events = parse_sse_line("data: {not json");
        assert!(matches!(&events[..], [StreamEvent::Error(m)] if m.starts_with("Invalid response")));
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#),
            Some("API key not valid.".to_string())
        );
        assert_eq!(error_message("<html>"), None);
    }
}
