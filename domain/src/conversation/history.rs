//! Conversation history used for continuation requests

use super::entities::{ConversationTurn, Role};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Ordered conversation log (Entity)
///
/// Turns alternate user/model by convention; this is not enforced. The index
/// of the most recent model turn is tracked as turns are added, so extending
/// the answer after a continuation never has to search the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ConversationTurn>", into = "Vec<ConversationTurn>")]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
    last_model: Option<usize>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History of a finished first review: the exact prompt and the answer.
    pub fn for_review(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.push(ConversationTurn::user(prompt));
        history.push(ConversationTurn::model(answer));
        history
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if turn.role == Role::Model {
            self.last_model = Some(self.turns.len());
        }
        self.turns.push(turn);
    }

    /// Concatenate `text` onto the most recent model turn.
    pub fn append_to_last_model(&mut self, text: &str) -> Result<(), DomainError> {
        let index = self.last_model.ok_or(DomainError::NoModelTurn)?;
        self.turns[index].append_text(text);
        Ok(())
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last_model_turn(&self) -> Option<&ConversationTurn> {
        self.last_model.map(|i| &self.turns[i])
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Combined text size of every turn, in bytes.
    pub fn total_text_bytes(&self) -> usize {
        self.turns.iter().map(ConversationTurn::text_len).sum()
    }

    pub fn into_turns(self) -> Vec<ConversationTurn> {
        self.turns
    }
}

impl From<Vec<ConversationTurn>> for ConversationHistory {
    fn from(turns: Vec<ConversationTurn>) -> Self {
        let last_model = turns.iter().rposition(|t| t.role == Role::Model);
        Self { turns, last_model }
    }
}

impl From<ConversationHistory> for Vec<ConversationTurn> {
    fn from(history: ConversationHistory) -> Self {
        history.turns
    }
}
