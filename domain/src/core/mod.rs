//! Core domain concepts shared across all subdomains.
//!
//! - [`file::CodeFile`]: a named source file submitted for review
//! - [`language::Language`]: review output language
//! - [`model::Model`]: hosted model identifiers
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod file;
pub mod language;
pub mod model;
