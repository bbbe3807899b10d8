//! # Heading control module
//!
//! Proportional heading control writing the steer demand. The controller starts disabled, setting
//! a target never enables it. It is gated by collision control, while blocked the steer demand is
//! held at its last value.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
