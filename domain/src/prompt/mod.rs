//! Prompt domain
//!
//! The review instruction document sent to the model. It is rendered by one
//! shared pure function so the relay and its callers always agree on the
//! exact text that opened a conversation.

mod template;

pub use template::PromptTemplate;
