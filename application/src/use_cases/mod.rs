//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod consume_review;
pub mod relay_review;
pub mod review_session;
