//! Parameters structure for WpCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for waypoint control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Distance to a waypoint within which it counts as reached.
    ///
    /// Units: meters
    pub arrival_radius_m: f64,

    /// Whether the controller is enabled at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Route loaded at startup, as `[x, y]` pairs in meters.
    #[serde(default)]
    pub route: Vec<[f64; 2]>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            arrival_radius_m: 1.0,
            enabled: false,
            route: Vec::new()
        }
    }
}
