//! Review session controller.
//!
//! Owns the conversation state of one user: the history of the latest review
//! and whether its answer was truncated. A review and its continuations run
//! one at a time.

use super::consume_review::{ConsumeReviewUseCase, ReviewError};
use crate::ports::review_callbacks::ReviewCallbacks;
use sentinel_domain::{
    CodeFile, ConversationHistory, DomainError, Language, PromptTemplate, ReviewRequest,
    StreamOutcome,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors raised by [`ReviewSession`] before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A review is already in progress.")]
    Busy,

    #[error("There is no truncated review to continue.")]
    NothingToContinue,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// History after a request finished without error.
///
/// A new review yields `[user: prompt, model: streamed]`, where the prompt is
/// exactly what the relay sent. A continuation extends the last model turn of
/// the supplied history with `streamed`, without a separator.
pub fn next_history(
    request: &ReviewRequest,
    streamed: &str,
) -> Result<ConversationHistory, DomainError> {
    match request {
        ReviewRequest::New { files, language } => Ok(ConversationHistory::for_review(
            PromptTemplate::build_prompt(files, *language),
            streamed,
        )),
        ReviewRequest::Continue { history } => {
            let mut history = history.clone();
            history.append_to_last_model(streamed)?;
            Ok(history)
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    history: Option<ConversationHistory>,
    truncated: bool,
}

/// Clears the busy flag when the operation ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Forwards to the caller's callbacks while keeping the streamed text.
struct Recorder<'a> {
    inner: &'a dyn ReviewCallbacks,
    text: Mutex<String>,
    failed: AtomicBool,
}

impl<'a> Recorder<'a> {
    fn new(inner: &'a dyn ReviewCallbacks) -> Self {
        Self {
            inner,
            text: Mutex::new(String::new()),
            failed: AtomicBool::new(false),
        }
    }

    fn failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn into_text(self) -> String {
        self.text.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReviewCallbacks for Recorder<'_> {
    fn on_chunk(&self, text: &str) {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
        self.inner.on_chunk(text);
    }

    fn on_error(&self, error: &ReviewError) {
        self.failed.store(true, Ordering::Release);
        self.inner.on_error(error);
    }

    fn on_finish(&self, truncated: bool) {
        self.inner.on_finish(truncated);
    }
}

/// Stateful review controller for one user.
pub struct ReviewSession {
    consumer: ConsumeReviewUseCase,
    busy: AtomicBool,
    state: Mutex<SessionState>,
}

impl ReviewSession {
    pub fn new(consumer: ConsumeReviewUseCase) -> Self {
        Self {
            consumer,
            busy: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// True when the latest answer was truncated and can be resumed.
    pub fn can_continue(&self) -> bool {
        let state = self.state();
        state.truncated && state.history.is_some()
    }

    /// History of the latest completed review, if any.
    pub fn history(&self) -> Option<ConversationHistory> {
        self.state().history.clone()
    }

    /// Review `files` from scratch. Any previous conversation is discarded.
    pub async fn start_review(
        &self,
        files: Vec<CodeFile>,
        language: Language,
        callbacks: &dyn ReviewCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, SessionError> {
        let _guard = self.acquire()?;
        *self.state() = SessionState::default();

        let request = ReviewRequest::new_review(files, language);
        self.run(request, callbacks, cancel).await
    }

    /// Resume the latest truncated answer.
    ///
    /// On failure the previous history is kept, so the continuation can be
    /// retried.
    pub async fn continue_review(
        &self,
        callbacks: &dyn ReviewCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, SessionError> {
        let _guard = self.acquire()?;
        let history = {
            let state = self.state();
            match (&state.history, state.truncated) {
                (Some(history), true) => history.clone(),
                _ => return Err(SessionError::NothingToContinue),
            }
        };

        let request = ReviewRequest::continuation(history);
        self.run(request, callbacks, cancel).await
    }

    async fn run(
        &self,
        request: ReviewRequest,
        callbacks: &dyn ReviewCallbacks,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, SessionError> {
        let recorder = Recorder::new(callbacks);
        let outcome = self.consumer.consume(&request, &recorder, cancel).await;

        if recorder.failed() || cancel.is_cancelled() {
            debug!(mode = request.mode(), "Review did not complete, history unchanged");
            return Ok(outcome);
        }

        let history = next_history(&request, &recorder.into_text())?;
        debug!(
            turns = history.len(),
            truncated = outcome.truncated,
            "Conversation history updated"
        );
        let mut state = self.state();
        state.history = Some(history);
        state.truncated = outcome.truncated;
        Ok(outcome)
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, SessionError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| SessionError::Busy)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::review_callbacks::NoCallbacks;
    use crate::ports::review_transport::{
        ReviewTransport, TransportError, TransportResponse,
    };
    use async_trait::async_trait;
    use futures::{StreamExt, stream};
    use sentinel_domain::{ConversationTurn, Framing, Role, TRUNCATION_MARKER};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Serves scripted inline bodies; optionally waits for `release` first.
    struct ScriptedTransport {
        bodies: Mutex<VecDeque<Vec<String>>>,
        requests: Mutex<Vec<ReviewRequest>>,
        release: Option<Arc<Notify>>,
    }

    impl ScriptedTransport {
        fn new(bodies: Vec<Vec<&str>>) -> Self {
            Self {
                bodies: Mutex::new(
                    bodies
                        .into_iter()
                        .map(|b| b.into_iter().map(String::from).collect())
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
                release: None,
            }
        }

        fn gated(mut self, release: Arc<Notify>) -> Self {
            self.release = Some(release);
            self
        }
    }

    #[async_trait]
    impl ReviewTransport for ScriptedTransport {
        async fn send(
            &self,
            request: &ReviewRequest,
        ) -> Result<TransportResponse, TransportError> {
            if let Some(release) = &self.release {
                release.notified().await;
            }
            self.requests.lock().unwrap().push(request.clone());
            let chunks = self
                .bodies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TransportError::Connection("refused".to_string()))?;
            let chunks: Vec<Result<Vec<u8>, TransportError>> =
                chunks.into_iter().map(|c| Ok(c.into_bytes())).collect();
            Ok(TransportResponse::Streaming {
                framing: Framing::Inline,
                body: stream::iter(chunks).boxed(),
            })
        }
    }

    fn session(transport: ScriptedTransport) -> (ReviewSession, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        (
            ReviewSession::new(ConsumeReviewUseCase::new(transport.clone())),
            transport,
        )
    }

    fn files() -> Vec<CodeFile> {
        vec![CodeFile::new("index.html", "<h1>Hi</h1>")]
    }

    #[test]
    fn test_next_history_for_new_review() {
        let request = ReviewRequest::new_review(files(), Language::Es);
        let history = next_history(&request, "answer").unwrap();

        let turns = history.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].text(), PromptTemplate::build_prompt(&files(), Language::Es));
        assert_eq!(turns[1], ConversationTurn::model("answer"));
    }

    #[test]
    fn test_next_history_appends_to_last_model_turn() {
        let request =
            ReviewRequest::continuation(ConversationHistory::for_review("P", "partial"));
        let history = next_history(&request, "continued text").unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].text(), "P");
        assert_eq!(
            history.last_model_turn().unwrap().text(),
            "partialcontinued text"
        );
    }

    #[test]
    fn test_next_history_without_model_turn() {
        let mut history = ConversationHistory::new();
        history.push(ConversationTurn::user("P"));
        let request = ReviewRequest::continuation(history);

        assert_eq!(
            next_history(&request, "x").unwrap_err(),
            DomainError::NoModelTurn
        );
    }

    #[tokio::test]
    async fn test_review_then_continuation() {
        let (session, transport) = session(ScriptedTransport::new(vec![
            vec!["part", "ial", TRUNCATION_MARKER],
            vec!["continued text"],
        ]));
        let cancel = CancellationToken::new();

        let first = session
            .start_review(files(), Language::En, &NoCallbacks, &cancel)
            .await
            .unwrap();
        assert!(first.truncated);
        assert!(session.can_continue());

        let second = session.continue_review(&NoCallbacks, &cancel).await.unwrap();
        assert!(!second.truncated);
        assert!(!session.can_continue());

        let history = session.history().unwrap();
        assert_eq!(
            history.last_model_turn().unwrap().text(),
            "partialcontinued text"
        );
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[1].mode(), "continue");
    }

    #[tokio::test]
    async fn test_continue_without_truncation_is_rejected() {
        let (session, _) = session(ScriptedTransport::new(vec![vec!["complete"]]));
        let cancel = CancellationToken::new();

        assert_eq!(
            session.continue_review(&NoCallbacks, &cancel).await,
            Err(SessionError::NothingToContinue)
        );

        session
            .start_review(files(), Language::En, &NoCallbacks, &cancel)
            .await
            .unwrap();
        assert_eq!(
            session.continue_review(&NoCallbacks, &cancel).await,
            Err(SessionError::NothingToContinue)
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failed_continuation_keeps_history() {
        let (session, _) = session(ScriptedTransport::new(vec![
            vec!["partial", TRUNCATION_MARKER],
            vec!["lost ", "STREAM_ERROR: quota exceeded"],
        ]));
        let cancel = CancellationToken::new();

        session
            .start_review(files(), Language::En, &NoCallbacks, &cancel)
            .await
            .unwrap();
        let outcome = session.continue_review(&NoCallbacks, &cancel).await.unwrap();

        assert!(!outcome.truncated);
        assert!(session.can_continue());
        assert_eq!(
            session.history().unwrap().last_model_turn().unwrap().text(),
            "partial"
        );
    }

    #[tokio::test]
    async fn test_second_operation_while_busy_is_rejected() {
        let release = Arc::new(Notify::new());
        let (session, _) =
            session(ScriptedTransport::new(vec![vec!["done"]]).gated(release.clone()));
        let session = Arc::new(session);
        let cancel = CancellationToken::new();

        let running = {
            let session = session.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                session
                    .start_review(files(), Language::En, &NoCallbacks, &cancel)
                    .await
            })
        };
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            session
                .start_review(files(), Language::En, &NoCallbacks, &cancel)
                .await,
            Err(SessionError::Busy)
        );

        release.notify_one();
        assert!(running.await.unwrap().is_ok());
        assert!(!session.is_busy());
        assert!(session.history().is_some());
    }
}
