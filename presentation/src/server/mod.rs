//! HTTP relay server
//!
//! Exposes [`RelayReviewUseCase`](sentinel_application::RelayReviewUseCase)
//! as `POST {path}` plus a `GET /healthz` probe.

pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::{AppState, router, serve};
