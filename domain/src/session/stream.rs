//! Streaming events for model session communication.
//!
//! [`StreamEvent`] represents individual events in a streaming model response,
//! enabling the relay to forward output as soon as it is generated.

use super::finish::FinishReason;

/// An event in a streaming model response.
///
/// Bridges infrastructure-level streaming (e.g. SSE chunks from the Gemini
/// API) to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text increment from the model.
    Delta(String),
    /// The model finished; carries its terminal status.
    Completed(FinishReason),
    /// Generation failed after the stream was opened.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_returns_content() {
        let event = StreamEvent::Delta("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn completed_is_terminal_without_text() {
        let event = StreamEvent::Completed(FinishReason::MaxTokens);
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }

    #[test]
    fn error_is_terminal() {
        let event = StreamEvent::Error("oops".to_string());
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }
}
