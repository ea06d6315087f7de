//! Wire formats shared by the relay and its consumers.
//!
//! - [`request`]: the JSON request body (new review or continuation)
//! - [`frame`]: relay frames, reserved in-band markers and framing selection
//! - [`decoder`]: incremental decoders turning response bytes back into frames
//! - [`error_body`]: the `{ "error": ... }` payload of rejected requests

pub mod decoder;
pub mod error_body;
pub mod frame;
pub mod request;
