//! Application layer for html5-sentinel
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::RelayLimits;
pub use ports::{
    llm_gateway::{GatewayError, LlmGateway, LlmSession, StreamHandle},
    review_callbacks::{NoCallbacks, ReviewCallbacks},
    review_transport::{BodyStream, ReviewTransport, TransportError, TransportResponse},
};
pub use use_cases::consume_review::{
    ConsumeReviewUseCase, ERROR_PREFIX, ReviewError, ReviewEvent, ReviewEvents,
};
pub use use_cases::relay_review::{RelayError, RelayReviewUseCase, RelayStream};
pub use use_cases::review_session::{ReviewSession, SessionError, next_history};
