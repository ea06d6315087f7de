//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod llm_gateway;
pub mod review_callbacks;
pub mod review_transport;
