//! Model session domain.
//!
//! - [`stream::StreamEvent`]: events of a streaming model response
//! - [`finish::FinishReason`]: why the model stopped generating
//! - [`finish::StreamOutcome`]: result of one relayed stream

pub mod finish;
pub mod stream;
