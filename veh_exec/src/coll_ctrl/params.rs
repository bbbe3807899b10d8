//! Parameters structure for CollCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for collision control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Clearance below which the vehicle is blocked.
    ///
    /// Units: meters
    pub safe_distance_m: f64,

    /// Half width of the forward sector in which bearing-tagged readings are considered. Readings
    /// outside it are ignored. Readings without a bearing are always considered.
    ///
    /// Units: radians
    #[serde(default)]
    pub sector_half_width_rad: Option<f64>,

    /// Whether the controller is enabled at startup.
    #[serde(default = "default_enabled")]
    pub enabled: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            safe_distance_m: 1.0,
            sector_half_width_rad: None,
            enabled: true
        }
    }
}

fn default_enabled() -> bool {
    true
}
