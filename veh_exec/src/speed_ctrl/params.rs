//! Parameters structure for SpeedCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for speed control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Throttle demand per unit of positive speed error.
    ///
    /// Units: 1/(meters/second)
    pub k_throttle: f64,

    /// Brake demand per unit of negative speed error.
    ///
    /// Units: 1/(meters/second)
    pub k_brake: f64,

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
            k_throttle: 0.5,
            k_brake: 0.5,
            enabled: true
        }
    }
}

fn default_enabled() -> bool {
    true
}
