//! Relay transports for the stream consumer

pub mod http;

pub use http::HttpReviewTransport;
