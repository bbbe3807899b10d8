//! # Collision control module
//!
//! Collision control watches the ranging sensor. While the nearest obstacle is closer than the
//! safe distance the vehicle is blocked: speed control is overridden to a full stop, and heading
//! and waypoint control suspend their updates.

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

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during CollCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum CollCtrlError {
    #[error("The safe distance must be a finite non-negative number of meters, found {0}")]
    InvalidSafeDistance(f64)
}
