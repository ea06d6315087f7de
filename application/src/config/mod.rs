//! Application-level configuration.
//!
//! - [`RelayLimits`]: request size ceilings enforced by the relay

pub mod relay_limits;

pub use relay_limits::RelayLimits;
