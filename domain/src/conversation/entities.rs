//! Conversation domain entities

use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A text fragment of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A single role-tagged message (Entity)
///
/// Serializes to the `{role, parts: [{text}]}` shape the model API and the
/// relay's request body share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::new(text)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::new(text)],
        }
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }

    /// Total text size in bytes.
    pub fn text_len(&self) -> usize {
        self.parts.iter().map(|p| p.text.len()).sum()
    }

    /// Append text to the final part, creating one if the turn has none.
    pub fn append_text(&mut self, text: &str) {
        match self.parts.last_mut() {
            Some(part) => part.text.push_str(text),
            None => self.parts.push(Part::new(text)),
        }
    }
}
