//! # Speed control module
//!
//! Proportional speed control. A positive speed error is driven out with throttle, a non-positive
//! one with the brake. Collision control has priority: while it is blocked the vehicle is brought
//! to a stop whatever the target or enabled state.

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
