//! Source files submitted for review

use serde::{Deserialize, Serialize};

/// A named source file (Value Object)
///
/// Immutable once read; a review replaces the whole set rather than editing
/// individual files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub name: String,
    pub content: String,
}

impl CodeFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Size of the raw content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Combined content size of a file set, in bytes.
pub fn total_content_bytes(files: &[CodeFile]) -> usize {
    files.iter().map(CodeFile::len).sum()
}
