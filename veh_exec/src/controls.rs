//! # Vehicle controls
//!
//! The actuator demand vector. Internally positive steer turns right and positive throttle drives
//! forwards, the simulator's inverted convention is only applied by [`VehicleControls::motion_dems`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::MotionDems;
use serde::{Deserialize, Serialize};
use util::{maths::clamp, module::Module};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Valid ranges of the demands.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    pub steer_min: f64,
    pub steer_max: f64,
    pub throttle_min: f64,
    pub throttle_max: f64,

    /// The brake is a non-negative magnitude, so only its maximum is configured.
    pub brake_max: f64
}

#[derive(Debug, Clone, Default)]
pub struct VehicleControls {
    params: Params,
    steer: f64,
    throttle: f64,
    brake: f64
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub steer: f64,
    pub throttle: f64,
    pub brake: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            steer_min: -1.0,
            steer_max: 1.0,
            throttle_min: -1.0,
            throttle_max: 1.0,
            brake_max: 1.0
        }
    }
}

impl Module for VehicleControls {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        Self {
            params,
            steer: 0.0,
            throttle: 0.0,
            brake: 0.0
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            steer: self.steer,
            throttle: self.throttle,
            brake: self.brake
        }
    }
}

impl VehicleControls {
    pub fn set_steer(&mut self, steer: f64) {
        self.steer = clamp(&steer, &self.params.steer_min, &self.params.steer_max);
    }

    pub fn set_throttle(&mut self, throttle: f64) {
        self.throttle = clamp(&throttle, &self.params.throttle_min, &self.params.throttle_max);
    }

    pub fn set_brake(&mut self, brake: f64) {
        self.brake = clamp(&brake, &0.0, &self.params.brake_max);
    }

    pub fn steer(&self) -> f64 {
        self.steer
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn brake(&self) -> f64 {
        self.brake
    }

    /// The largest brake demand that can be applied.
    pub fn brake_max(&self) -> f64 {
        self.params.brake_max.max(0.0)
    }

    /// Build the motion demands sent to the simulator, which uses positive steer to the left and
    /// positive force backwards.
    pub fn motion_dems(&self) -> MotionDems {
        MotionDems {
            steer: -self.steer,
            force: -self.throttle,
            brake: self.brake
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamped_setters() {
        let mut controls = VehicleControls::new(Params {
            steer_min: -0.5,
            steer_max: 0.5,
            throttle_min: 0.0,
            throttle_max: 0.8,
            brake_max: 2.0
        });

        controls.set_steer(-3.0);
        controls.set_throttle(-1.0);
        controls.set_brake(-0.1);
        assert_eq!(controls.steer(), -0.5);
        assert_eq!(controls.throttle(), 0.0);
        assert_eq!(controls.brake(), 0.0);

        controls.set_steer(0.2);
        controls.set_throttle(9.0);
        controls.set_brake(9.0);
        assert_eq!(controls.steer(), 0.2);
        assert_eq!(controls.throttle(), 0.8);
        assert_eq!(controls.brake(), 2.0);
    }

    #[test]
    fn test_motion_polarity() {
        let mut controls = VehicleControls::new(Params::default());
        controls.set_steer(0.2);
        controls.set_throttle(0.5);
        controls.set_brake(0.1);

        let dems = controls.motion_dems();

        assert_eq!(dems.steer, -0.2);
        assert_eq!(dems.force, -0.5);
        assert_eq!(dems.brake, 0.1);
    }
}
