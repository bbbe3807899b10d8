//! # Waypoint control module
//!
//! Waypoint control follows a route of straight legs. On every update it steers heading control
//! towards the active waypoint, and advances to the next one once inside the arrival radius. On
//! reaching the last waypoint the route is complete: the controller parks, freezing the index and
//! heading target, and disables itself.

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

/// Possible errors that can occur during WpCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum WpCtrlError {
    #[error("Waypoint ({0}, {1}) is not finite")]
    NonFiniteWaypoint(f64, f64),

    #[error("The arrival radius must be a finite non-negative number of meters, found {0}")]
    InvalidArrivalRadius(f64)
}
