//! Conversation domain.
//!
//! - [`entities::ConversationTurn`]: one role-tagged message
//! - [`history::ConversationHistory`]: ordered turns used to resume a truncated review

pub mod entities;
pub mod history;
