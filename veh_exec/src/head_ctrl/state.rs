//! Implementations for the HeadCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::Params;
use crate::{coll_ctrl::CollCtrl, controls::VehicleControls, state::VehicleState};
use util::{maths::wrap_pi, module::Module};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Heading control module state
#[derive(Debug, Clone)]
pub struct HeadCtrl {
    pub(crate) params: Params,

    /// Target heading.
    ///
    /// Units: radians
    pub target_heading: f64,

    pub(crate) enabled: bool,

    /// Error computed on the last active update, in `(-pi, pi]`
    heading_error: f64
}

/// Status report for HeadCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub enabled: bool,
    pub target_heading: f64,
    pub heading_error: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Module for HeadCtrl {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        Self {
            enabled: params.enabled,
            params,
            target_heading: 0.0,
            heading_error: 0.0
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            enabled: self.enabled,
            target_heading: self.target_heading,
            heading_error: self.heading_error
        }
    }
}

impl HeadCtrl {
    /// Run the controller against the current state.
    ///
    /// Nothing is written while disabled or while collision control is blocked.
    pub fn update(
        &mut self,
        state: &VehicleState,
        coll_ctrl: &CollCtrl,
        controls: &mut VehicleControls
    ) {
        if !self.enabled || coll_ctrl.is_blocked() {
            return
        }

        self.heading_error = wrap_pi(self.target_heading - state.yaw);

        let steer = self.params.k_p * self.heading_error;
        trace!("HeadCtrl error {:.4}, steer {:.4}", self.heading_error, steer);

        controls.set_steer(steer);
    }

    /// Set the target heading, the enabled state is unchanged.
    pub fn set_heading(&mut self, target_heading: f64) {
        self.target_heading = target_heading;
    }

    /// Manually set the steer demand, disabling closed-loop control.
    pub fn set_steer(&mut self, controls: &mut VehicleControls, steer: f64) {
        self.enabled = false;
        controls.set_steer(steer);
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
    use std::f64::consts::PI;

    fn parts() -> (VehicleState, CollCtrl, VehicleControls, HeadCtrl) {
        (
            VehicleState::default(),
            CollCtrl::new(coll_ctrl::Params::default()),
            VehicleControls::new(controls::Params::default()),
            HeadCtrl::new(Params { k_p: 0.5, enabled: false })
        )
    }

    #[test]
    fn test_set_heading_does_not_enable() {
        let (state, cc, mut controls, mut hc) = parts();

        hc.set_heading(1.0);
        hc.update(&state, &cc, &mut controls);

        assert!(!hc.status().enabled);
        assert_eq!(controls.steer(), 0.0);
        assert_eq!(hc.status().heading_error, 0.0);

        hc.enable();
        hc.update(&state, &cc, &mut controls);
        assert_eq!(hc.status().heading_error, 1.0);
        assert_eq!(controls.steer(), 0.5);
    }

    #[test]
    fn test_error_takes_shortest_path() {
        let (mut state, cc, mut controls, mut hc) = parts();
        hc.enable();

        state.update_compass(PI - 0.1);
        hc.set_heading(-PI + 0.1);
        hc.update(&state, &cc, &mut controls);

        assert!((hc.status().heading_error - 0.2).abs() < 1e-12);
        assert!((controls.steer() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_blocked_holds_steer() {
        let (state, mut cc, mut controls, mut hc) = parts();
        hc.enable();
        hc.set_heading(0.4);
        hc.update(&state, &cc, &mut controls);
        assert_eq!(controls.steer(), 0.2);

        cc.update_range(vec![RangeReading::Distance(0.1)]);
        hc.set_heading(-1.5);
        hc.update(&state, &cc, &mut controls);

        assert_eq!(controls.steer(), 0.2);
    }

    #[test]
    fn test_manual_steer_disables() {
        let (state, cc, mut controls, mut hc) = parts();
        hc.enable();

        hc.set_steer(&mut controls, -0.3);
        assert!(!hc.status().enabled);
        assert_eq!(controls.steer(), -0.3);

        hc.set_heading(1.0);
        hc.update(&state, &cc, &mut controls);
        assert_eq!(controls.steer(), -0.3);
    }
}
