//! Domain layer for html5-sentinel
//!
//! This crate contains the core entities, value objects and pure functions of
//! the review pipeline. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Review
//!
//! A review takes a set of [`CodeFile`]s and a [`Language`], renders them into
//! a single instruction document via [`PromptTemplate::build_prompt`], and
//! streams the model's Markdown answer back to the caller.
//!
//! ## Relay framing
//!
//! The relay writes [`RelayFrame`]s onto a single HTTP response body. Two
//! encodings exist ([`Framing`]): plain text with reserved in-band markers,
//! and line-delimited JSON envelopes. Both are decoded by a [`StreamDecoder`].
//!
//! ## Continuation
//!
//! When the model stops because of its output length limit, the caller keeps
//! a [`ConversationHistory`] and asks the relay to resume from it instead of
//! resending the files.

pub mod conversation;
pub mod core;
pub mod prompt;
pub mod session;
pub mod util;
pub mod wire;

// Re-export commonly used types
pub use conversation::{
    entities::{ConversationTurn, Part, Role},
    history::ConversationHistory,
};
pub use core::{
    error::DomainError,
    file::{CodeFile, total_content_bytes},
    language::Language,
    model::Model,
};
pub use prompt::PromptTemplate;
pub use session::{
    finish::{FinishReason, StreamOutcome},
    stream::StreamEvent,
};
pub use wire::{
    decoder::StreamDecoder,
    error_body::ErrorBody,
    frame::{ERROR_MARKER, Framing, RelayFrame, TRUNCATION_MARKER},
    request::{ReviewRequest, ReviewRequestBody},
};
