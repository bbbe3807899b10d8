//! Implementations for the SpeedCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::Params;
use crate::{coll_ctrl::CollCtrl, controls::VehicleControls, state::VehicleState};
use util::module::Module;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed control module state
#[derive(Debug, Clone)]
pub struct SpeedCtrl {
    pub(crate) params: Params,

    /// Target speed.
    ///
    /// Units: meters/second
    pub target_speed: f64,

    pub(crate) enabled: bool,

    /// Error computed on the last update
    speed_error: f64
}

/// Status report for SpeedCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub target_speed: f64,
    pub speed_error: f64,
    pub enabled: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Module for SpeedCtrl {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        Self {
            enabled: params.enabled,
            params,
            target_speed: 0.0,
            speed_error: 0.0
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            target_speed: self.target_speed,
            speed_error: self.speed_error,
            enabled: self.enabled
        }
    }
}

impl SpeedCtrl {
    /// Run the controller against the current state.
    ///
    /// The error is always recomputed. If collision control is blocked its override is applied
    /// instead of the controller's own demands, otherwise the demands are only written while
    /// enabled.
    pub fn update(
        &mut self,
        state: &VehicleState,
        coll_ctrl: &CollCtrl,
        controls: &mut VehicleControls
    ) {
        self.speed_error = self.target_speed - state.speed;

        if coll_ctrl.is_blocked() {
            coll_ctrl.override_speed(controls);
            return
        }

        if !self.enabled {
            return
        }

        let (throttle, brake) = if self.speed_error > 0.0 {
            (self.params.k_throttle * self.speed_error, 0.0)
        }
        else {
            (0.0, self.params.k_brake * -self.speed_error)
        };

        trace!("SpeedCtrl error {:.4}, throttle {:.4}, brake {:.4}", self.speed_error, throttle, brake);

        controls.set_throttle(throttle);
        controls.set_brake(brake);
    }

    pub fn set_speed(&mut self, target_speed: f64) {
        self.target_speed = target_speed;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{coll_ctrl, controls};
    use comms_if::sim::RangeReading;

    struct Fixture {
        state: VehicleState,
        coll_ctrl: CollCtrl,
        controls: VehicleControls,
        speed_ctrl: SpeedCtrl
    }

    fn fixture() -> Fixture {
        Fixture {
            state: VehicleState::default(),
            coll_ctrl: CollCtrl::new(coll_ctrl::Params::default()),
            controls: VehicleControls::new(controls::Params::default()),
            speed_ctrl: SpeedCtrl::new(Params { k_throttle: 0.5, k_brake: 0.25, enabled: true })
        }
    }

    impl Fixture {
        fn update(&mut self) {
            self.speed_ctrl.update(&self.state, &self.coll_ctrl, &mut self.controls);
        }
    }

    #[test]
    fn test_throttle_and_brake_split() {
        let mut f = fixture();

        f.speed_ctrl.set_speed(1.0);
        f.update();
        assert_eq!(f.controls.throttle(), 0.5);
        assert_eq!(f.controls.brake(), 0.0);

        // Clamped to the throttle range
        f.speed_ctrl.set_speed(10.0);
        f.update();
        assert_eq!(f.controls.throttle(), 1.0);

        f.state.speed = 12.0;
        f.update();
        assert_eq!(f.controls.throttle(), 0.0);
        assert_eq!(f.controls.brake(), 0.5);
        assert_eq!(f.speed_ctrl.status().speed_error, -2.0);

        // Zero error releases the throttle
        f.state.speed = 10.0;
        f.update();
        assert_eq!(f.controls.throttle(), 0.0);
        assert_eq!(f.controls.brake(), 0.0);
    }

    #[test]
    fn test_disabled_writes_nothing() {
        let mut f = fixture();
        f.controls.set_throttle(0.3);
        f.speed_ctrl.disable();
        f.speed_ctrl.set_speed(5.0);

        f.update();

        assert_eq!(f.controls.throttle(), 0.3);
        assert_eq!(f.speed_ctrl.status().speed_error, 5.0);
        assert!(!f.speed_ctrl.status().enabled);
    }

    #[test]
    fn test_collision_priority() {
        let mut f = fixture();
        f.speed_ctrl.set_speed(5.0);
        f.coll_ctrl.update_range(vec![RangeReading::Distance(0.2)]);

        f.update();
        assert_eq!(f.controls.throttle(), 0.0);
        assert_eq!(f.controls.brake(), 1.0);

        // The override also applies while speed control is disabled
        f.controls.set_throttle(0.8);
        f.controls.set_brake(0.0);
        f.speed_ctrl.disable();
        f.update();
        assert_eq!(f.controls.throttle(), 0.0);
        assert_eq!(f.controls.brake(), 1.0);
    }
}
