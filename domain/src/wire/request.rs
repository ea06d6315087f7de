//! Relay request body

use crate::conversation::{entities::ConversationTurn, history::ConversationHistory};
use crate::core::{error::DomainError, file::CodeFile, language::Language};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// JSON body accepted by the relay.
///
/// Either `{files, language}` for a new review or `{history}` for a
/// continuation. A non-empty `history` takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<CodeFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ConversationTurn>>,
}

/// A validated relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewRequest {
    /// Review a fresh set of files.
    New {
        files: Vec<CodeFile>,
        language: Language,
    },
    /// Resume a truncated answer from its conversation history.
    Continue { history: ConversationHistory },
}

impl ReviewRequest {
    pub fn new_review(files: Vec<CodeFile>, language: Language) -> Self {
        ReviewRequest::New { files, language }
    }

    pub fn continuation(history: ConversationHistory) -> Self {
        ReviewRequest::Continue { history }
    }

    /// Short label for logging.
    pub fn mode(&self) -> &'static str {
        match self {
            ReviewRequest::New { .. } => "review",
            ReviewRequest::Continue { .. } => "continue",
        }
    }

    pub fn to_body(&self) -> ReviewRequestBody {
        match self {
            ReviewRequest::New { files, language } => ReviewRequestBody {
                files: Some(files.clone()),
                language: Some(*language),
                history: None,
            },
            ReviewRequest::Continue { history } => ReviewRequestBody {
                files: None,
                language: None,
                history: Some(history.turns().to_vec()),
            },
        }
    }
}

impl TryFrom<ReviewRequestBody> for ReviewRequest {
    type Error = DomainError;

    fn try_from(body: ReviewRequestBody) -> Result<Self, Self::Error> {
        if let Some(history) = body.history
            && !history.is_empty()
        {
            return Ok(ReviewRequest::Continue {
                history: history.into(),
            });
        }

        let (files, language) = match (body.files, body.language) {
            (Some(files), Some(language)) if !files.is_empty() => (files, language),
            _ => return Err(DomainError::MissingInput),
        };

        let mut seen = HashSet::new();
        if let Some(dup) = files.iter().find(|f| !seen.insert(f.name.as_str())) {
            return Err(DomainError::DuplicateFile(dup.name.clone()));
        }

        Ok(ReviewRequest::New { files, language })
    }
}
