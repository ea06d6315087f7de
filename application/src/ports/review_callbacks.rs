//! Review stream callbacks port
//!
//! Defines how the stream consumer reports progress to whoever renders it.

use crate::use_cases::consume_review::ReviewError;

/// Callbacks invoked while a review response is consumed.
///
/// Implementations live in the presentation layer (console renderer) or
/// wrap another implementation (session bookkeeping). For one consume call,
/// `on_chunk` fires in arrival order, `on_error` at most once, and
/// `on_finish` exactly once and last.
pub trait ReviewCallbacks: Send + Sync {
    /// Called for each piece of review text, as soon as it arrives.
    fn on_chunk(&self, text: &str);

    /// Called once when the review failed.
    fn on_error(&self, error: &ReviewError);

    /// Called once at the very end; `truncated` offers a continuation.
    fn on_finish(&self, truncated: bool);
}

/// No-op callbacks
pub struct NoCallbacks;

impl ReviewCallbacks for NoCallbacks {
    fn on_chunk(&self, _text: &str) {}
    fn on_error(&self, _error: &ReviewError) {}
    fn on_finish(&self, _truncated: bool) {}
}
