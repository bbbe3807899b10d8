//! Parameters structure for HeadCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for heading control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Steer demand per radian of heading error.
    pub k_p: f64,

    /// Whether the controller is enabled at startup.
    #[serde(default)]
    pub enabled: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 1.0,
            enabled: false
        }
    }
}
