//! Consume review use case.
//!
//! The client side of the pipeline: sends a [`ReviewRequest`] through a
//! [`ReviewTransport`], decodes the relayed body as it arrives and reports
//! text, errors and the final truncation status through [`ReviewCallbacks`].

use crate::ports::review_callbacks::ReviewCallbacks;
use crate::ports::review_transport::{ReviewTransport, TransportResponse};
use futures::StreamExt;
use sentinel_domain::{ErrorBody, RelayFrame, ReviewRequest, StreamDecoder, StreamOutcome};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Prefix of every error shown to the user.
pub const ERROR_PREFIX: &str = "Error during analysis: ";

/// Why a review did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// The relay refused the request before streaming.
    #[error("{0}")]
    Rejected(String),

    /// Network or body-read failure.
    #[error("{0}")]
    Transport(String),

    #[error("Response body is empty.")]
    EmptyBody,

    /// In-band failure reported by the relay mid-stream.
    #[error("{0}")]
    Generation(String),
}

impl ReviewError {
    /// Message as presented to the user.
    pub fn user_message(&self) -> String {
        format!("{}{}", ERROR_PREFIX, self)
    }
}

/// One observation from a review running in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    Chunk(String),
    Error(ReviewError),
    /// Always the last event.
    Finished { truncated: bool },
}

/// Events of a review started with [`ConsumeReviewUseCase::spawn_events`].
pub struct ReviewEvents {
    receiver: mpsc::UnboundedReceiver<ReviewEvent>,
}

impl ReviewEvents {
    pub async fn next(&mut self) -> Option<ReviewEvent> {
        self.receiver.recv().await
    }
}

struct ChannelCallbacks {
    tx: mpsc::UnboundedSender<ReviewEvent>,
}

impl ReviewCallbacks for ChannelCallbacks {
    fn on_chunk(&self, text: &str) {
        let _ = self.tx.send(ReviewEvent::Chunk(text.to_string()));
    }

    fn on_error(&self, error: &ReviewError) {
        let _ = self.tx.send(ReviewEvent::Error(error.clone()));
    }

    fn on_finish(&self, truncated: bool) {
        let _ = self.tx.send(ReviewEvent::Finished { truncated });
    }
}

/// Use case for consuming a relayed review.
#[derive(Clone)]
pub struct ConsumeReviewUseCase {
    transport: Arc<dyn ReviewTransport>,
}

impl ConsumeReviewUseCase {
    pub fn new(transport: Arc<dyn ReviewTransport>) -> Self {
        Self { transport }
    }

    /// Run one review to completion.
    ///
    /// `on_finish` is called exactly once, whatever happens, and is always
    /// the last callback. Cancelling `cancel` stops reading and finishes
    /// with `truncated = false`.
    pub async fn consume(
        &self,
        request: &ReviewRequest,
        callbacks: &dyn ReviewCallbacks,
        cancel: &CancellationToken,
    ) -> StreamOutcome {
        let truncated = match self.run(request, callbacks, cancel).await {
            Ok(truncated) => truncated,
            Err(error) => {
                warn!(mode = request.mode(), "Review failed: {}", error);
                callbacks.on_error(&error);
                false
            }
        };
        callbacks.on_finish(truncated);
        StreamOutcome { truncated }
    }

    /// Run the review on a background task and observe it as events.
    pub fn spawn_events(&self, request: ReviewRequest, cancel: CancellationToken) -> ReviewEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = self.clone();
        tokio::spawn(async move {
            let callbacks = ChannelCallbacks { tx };
            consumer.consume(&request, &callbacks, &cancel).await;
        });
        ReviewEvents { receiver: rx }
    }

    async fn run(
        &self,
        request: &ReviewRequest,
        callbacks: &dyn ReviewCallbacks,
        cancel: &CancellationToken,
    ) -> Result<bool, ReviewError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Review cancelled before the relay answered");
                return Ok(false);
            }
            response = self.transport.send(request) => {
                response.map_err(|e| ReviewError::Transport(e.to_string()))?
            }
        };

        let (framing, mut body) = match response {
            TransportResponse::Rejected {
                status,
                status_text,
                body,
            } => {
                info!(status, "Relay rejected the request");
                return Err(ReviewError::Rejected(rejection_message(
                    status,
                    &status_text,
                    &body,
                )));
            }
            TransportResponse::Streaming { framing, body } => (framing, body),
        };

        debug!(%framing, mode = request.mode(), "Reading review stream");
        let mut decoder = StreamDecoder::new(framing);
        let mut progress = Progress::default();
        let mut received = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(received, "Review cancelled while streaming");
                    return Ok(false);
                }
                next = body.next() => next,
            };

            let (frames, at_end) = match next {
                Some(Ok(bytes)) => {
                    received += bytes.len();
                    (decoder.push(&bytes), false)
                }
                Some(Err(e)) => return Err(ReviewError::Transport(e.to_string())),
                None => (decoder.finish(), true),
            };

            if dispatch(frames, callbacks, &mut progress)? || at_end {
                // No text and no marker, whatever the framing.
                if !progress.answered {
                    return Err(ReviewError::EmptyBody);
                }
                debug!(received, truncated = progress.truncated, "Review stream ended");
                return Ok(progress.truncated);
            }
        }
    }
}

/// What the decoded frames have reported so far.
#[derive(Debug, Default)]
struct Progress {
    truncated: bool,
    answered: bool,
}

/// Deliver decoded frames. Returns `Ok(true)` once an explicit end frame is seen.
fn dispatch(
    frames: Vec<RelayFrame>,
    callbacks: &dyn ReviewCallbacks,
    progress: &mut Progress,
) -> Result<bool, ReviewError> {
    for frame in frames {
        match frame {
            RelayFrame::Content(text) => {
                progress.answered |= !text.is_empty();
                callbacks.on_chunk(&text);
            }
            RelayFrame::Truncated => {
                debug!("Truncation marker received");
                progress.answered = true;
                progress.truncated = true;
            }
            RelayFrame::Error(message) => {
                debug!("Error marker received");
                return Err(ReviewError::Generation(message));
            }
            RelayFrame::Done => return Ok(true),
        }
    }
    Ok(false)
}

fn rejection_message(status: u16, status_text: &str, body: &str) -> String {
    if let Some(message) = ErrorBody::parse_message(body) {
        return message;
    }
    if !status_text.trim().is_empty() {
        return status_text.to_string();
    }
    format!("Request failed with status {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::review_transport::{BodyStream, TransportError};
    use async_trait::async_trait;
    use futures::stream;
    use sentinel_domain::{
        CodeFile, ConversationHistory, Framing, Language, TRUNCATION_MARKER,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Chunk(String),
        Error(String),
        Finish(bool),
    }

    #[derive(Default)]
    struct RecordingCallbacks {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingCallbacks {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ReviewCallbacks for RecordingCallbacks {
        fn on_chunk(&self, text: &str) {
            self.calls.lock().unwrap().push(Call::Chunk(text.to_string()));
        }

        fn on_error(&self, error: &ReviewError) {
            self.calls.lock().unwrap().push(Call::Error(error.user_message()));
        }

        fn on_finish(&self, truncated: bool) {
            self.calls.lock().unwrap().push(Call::Finish(truncated));
        }
    }

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        requests: Mutex<Vec<ReviewRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReviewTransport for ScriptedTransport {
        async fn send(
            &self,
            request: &ReviewRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Connection("no scripted response".into())))
        }
    }

    fn body(chunks: &[&str]) -> BodyStream {
        let chunks: Vec<Result<Vec<u8>, TransportError>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        stream::iter(chunks).boxed()
    }

    fn streaming(chunks: &[&str]) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::Streaming {
            framing: Framing::Inline,
            body: body(chunks),
        })
    }

    fn request() -> ReviewRequest {
        ReviewRequest::new_review(vec![CodeFile::new("index.html", "<p>hi</p>")], Language::En)
    }

    async fn run(responses: Vec<Result<TransportResponse, TransportError>>) -> (StreamOutcome, Vec<Call>) {
        let consumer = ConsumeReviewUseCase::new(Arc::new(ScriptedTransport::new(responses)));
        let callbacks = RecordingCallbacks::default();
        let outcome = consumer
            .consume(&request(), &callbacks, &CancellationToken::new())
            .await;
        (outcome, callbacks.calls())
    }

    #[tokio::test]
    async fn test_chunks_forwarded_in_order() {
        let (outcome, calls) = run(vec![streaming(&["Hello ", "world"])]).await;

        assert_eq!(
            calls,
            vec![
                Call::Chunk("Hello ".to_string()),
                Call::Chunk("world".to_string()),
                Call::Finish(false),
            ]
        );
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_truncation_marker_is_stripped() {
        let (outcome, calls) =
            run(vec![streaming(&["partial answer", TRUNCATION_MARKER])]).await;

        assert_eq!(
            calls,
            vec![
                Call::Chunk("partial answer".to_string()),
                Call::Finish(true),
            ]
        );
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_truncation_marker_split_across_reads() {
        let (outcome, calls) =
            run(vec![streaming(&["partial answer__STREAM_", "TRUNCATED__"])]).await;

        assert_eq!(
            calls,
            vec![
                Call::Chunk("partial answer".to_string()),
                Call::Finish(true),
            ]
        );
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_in_band_error_stops_the_review() {
        let (outcome, calls) = run(vec![streaming(&[
            "## Overall",
            "STREAM_ERROR: model ",
            "overloaded",
        ])])
        .await;

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], Call::Chunk("## Overall".to_string()));
        assert_eq!(
            calls[1],
            Call::Error(format!("{}model overloaded", ERROR_PREFIX))
        );
        assert_eq!(calls[2], Call::Finish(false));
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_rejection_uses_error_body() {
        let (_, calls) = run(vec![Ok(TransportResponse::Rejected {
            status: 413,
            status_text: "Payload Too Large".to_string(),
            body: r#"{"error":"Combined file content is too large."}"#.to_string(),
        })])
        .await;

        assert_eq!(
            calls,
            vec![
                Call::Error(format!(
                    "{}Combined file content is too large.",
                    ERROR_PREFIX
                )),
                Call::Finish(false),
            ]
        );
    }

    #[test]
    fn test_rejection_message_fallbacks() {
        assert_eq!(
            rejection_message(502, "Bad Gateway", "<html>oops</html>"),
            "Bad Gateway"
        );
        assert_eq!(
            rejection_message(500, "", ""),
            "Request failed with status 500"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_finishes_once() {
        let (_, calls) = run(vec![Err(TransportError::Connection(
            "connection refused".to_string(),
        ))])
        .await;

        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], Call::Error(m) if m.contains("connection refused")));
        assert_eq!(calls[1], Call::Finish(false));
    }

    #[tokio::test]
    async fn test_body_failure_after_truncation_is_not_truncated() {
        let chunks: Vec<Result<Vec<u8>, TransportError>> = vec![
            Ok(b"text".to_vec()),
            Ok(TRUNCATION_MARKER.as_bytes().to_vec()),
            Err(TransportError::Body("reset by peer".to_string())),
        ];
        let (outcome, calls) = run(vec![Ok(TransportResponse::Streaming {
            framing: Framing::Inline,
            body: stream::iter(chunks).boxed(),
        })])
        .await;

        assert_eq!(calls[0], Call::Chunk("text".to_string()));
        assert!(matches!(&calls[1], Call::Error(m) if m.contains("reset by peer")));
        assert_eq!(calls[2], Call::Finish(false));
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error_under_either_framing() {
        let (_, inline_calls) = run(vec![streaming(&[])]).await;
        let (_, ndjson_calls) = run(vec![Ok(TransportResponse::Streaming {
            framing: Framing::Ndjson,
            body: body(&["{\"type\":\"done\"}\n"]),
        })])
        .await;

        let expected = vec![
            Call::Error("Error during analysis: Response body is empty.".to_string()),
            Call::Finish(false),
        ];
        assert_eq!(inline_calls, expected);
        assert_eq!(ndjson_calls, expected);
    }

    #[tokio::test]
    async fn test_ndjson_frames() {
        let (outcome, calls) = run(vec![Ok(TransportResponse::Streaming {
            framing: Framing::Ndjson,
            body: body(&[
                "{\"type\":\"content\",\"data\":\"STREAM_ERROR: is just text\"}\n{\"type\":\"tru",
                "ncated\"}\n{\"type\":\"done\"}\n",
            ]),
        })])
        .await;

        assert_eq!(
            calls,
            vec![
                Call::Chunk("STREAM_ERROR: is just text".to_string()),
                Call::Finish(true),
            ]
        );
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_sends_continuation_request() {
        let transport = Arc::new(ScriptedTransport::new(vec![streaming(&["more"])]));
        let consumer = ConsumeReviewUseCase::new(transport.clone());
        let request =
            ReviewRequest::continuation(ConversationHistory::for_review("P", "partial"));

        consumer
            .consume(&request, &RecordingCallbacks::default(), &CancellationToken::new())
            .await;

        assert_eq!(transport.requests.lock().unwrap().as_slice(), &[request]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_finishes_without_sending() {
        let transport = Arc::new(ScriptedTransport::new(vec![streaming(&["never"])]));
        let consumer = ConsumeReviewUseCase::new(transport.clone());
        let callbacks = RecordingCallbacks::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        consumer.consume(&request(), &callbacks, &cancel).await;

        assert_eq!(callbacks.calls(), vec![Call::Finish(false)]);
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_review_can_be_cancelled() {
        let chunks: Vec<Result<Vec<u8>, TransportError>> = vec![Ok(b"Hello".to_vec())];
        let body = stream::iter(chunks).chain(stream::pending()).boxed();
        let consumer = ConsumeReviewUseCase::new(Arc::new(ScriptedTransport::new(vec![Ok(
            TransportResponse::Streaming {
                framing: Framing::Inline,
                body,
            },
        )])));
        let cancel = CancellationToken::new();

        let mut events = consumer.spawn_events(request(), cancel.clone());

        assert_eq!(events.next().await, Some(ReviewEvent::Chunk("Hello".to_string())));
        cancel.cancel();
        assert_eq!(
            events.next().await,
            Some(ReviewEvent::Finished { truncated: false })
        );
        assert_eq!(events.next().await, None);
    }
}
