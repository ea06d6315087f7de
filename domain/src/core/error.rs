//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Missing files or language in request body.")]
    MissingInput,

    #[error("Duplicate file name in request: {0}")]
    DuplicateFile(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Conversation history has no model turn to extend")]
    NoModelTurn,
}
