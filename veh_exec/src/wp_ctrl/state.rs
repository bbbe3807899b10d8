//! Implementations for the WpCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use nalgebra::Point2;
use serde::Serialize;

// Internal
use super::{Params, WpCtrlError};
use crate::{coll_ctrl::CollCtrl, head_ctrl::HeadCtrl, state::VehicleState};
use util::module::Module;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Waypoint control module state
#[derive(Debug, Clone)]
pub struct WpCtrl {
    pub(crate) params: Params,

    /// The waypoints to visit, in order
    route: Vec<Point2<f64>>,

    /// Index of the active waypoint, always within the route while it is non-empty
    index: usize,

    /// Distance to the active waypoint on the last update
    distance: Option<f64>,

    pub(crate) enabled: bool,

    /// Set once the last waypoint has been reached
    complete: bool
}

/// Status report for WpCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub index: usize,
    pub distance: Option<f64>,
    pub enabled: bool,
    pub num_waypoints: usize,
    pub complete: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Module for WpCtrl {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        let route = params.route
            .iter()
            .filter(|p| {
                let finite = p[0].is_finite() && p[1].is_finite();
                if !finite {
                    warn!("Ignoring non-finite waypoint {:?} in the startup route", p);
                }
                finite
            })
            .map(|p| Point2::new(p[0], p[1]))
            .collect();

        Self {
            enabled: params.enabled,
            params,
            route,
            index: 0,
            distance: None,
            complete: false
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            index: self.index,
            distance: self.distance,
            enabled: self.enabled,
            num_waypoints: self.route.len(),
            complete: self.complete
        }
    }
}

impl WpCtrl {
    /// Run the controller against the current state.
    ///
    /// Does nothing while disabled, while collision control is blocked or if the route is empty.
    pub fn update(
        &mut self,
        state: &VehicleState,
        coll_ctrl: &CollCtrl,
        head_ctrl: &mut HeadCtrl
    ) {
        if !self.enabled || coll_ctrl.is_blocked() {
            return
        }

        let target = match self.route.get(self.index) {
            Some(t) => *t,
            None => return
        };

        let delta = target - Point2::new(state.x, state.y);

        head_ctrl.set_heading(delta.y.atan2(delta.x));

        let distance = delta.norm();
        self.distance = Some(distance);

        if distance <= self.params.arrival_radius_m {
            if self.index + 1 < self.route.len() {
                self.index += 1;
                info!("Waypoint {} reached, heading for waypoint {}", self.index - 1, self.index);
            }
            else {
                info!("Final waypoint {} reached, route complete", self.index);
                self.complete = true;
                self.enabled = false;
            }
        }
    }

    /// Replace the route, restarting from its first waypoint.
    pub fn set_route(&mut self, points: Vec<[f64; 2]>) -> Result<(), WpCtrlError> {
        if let Some(p) = points.iter().find(|p| !(p[0].is_finite() && p[1].is_finite())) {
            return Err(WpCtrlError::NonFiniteWaypoint(p[0], p[1]))
        }

        self.route = points.into_iter().map(|p| Point2::new(p[0], p[1])).collect();
        self.index = 0;
        self.distance = None;
        self.complete = false;

        Ok(())
    }

    /// Append a waypoint to the route.
    ///
    /// If the route was complete the new waypoint becomes the active one, the controller must be
    /// re-enabled to drive to it.
    pub fn add_waypoint(&mut self, x: f64, y: f64) -> Result<(), WpCtrlError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(WpCtrlError::NonFiniteWaypoint(x, y))
        }

        self.route.push(Point2::new(x, y));

        if self.complete {
            self.index = self.route.len() - 1;
            self.complete = false;
            self.distance = None;
        }

        Ok(())
    }

    pub fn clear_route(&mut self) {
        self.route.clear();
        self.index = 0;
        self.distance = None;
        self.complete = false;
    }

    pub fn set_arrival_radius(&mut self, arrival_radius_m: f64) -> Result<(), WpCtrlError> {
        if !arrival_radius_m.is_finite() || arrival_radius_m < 0.0 {
            return Err(WpCtrlError::InvalidArrivalRadius(arrival_radius_m))
        }

        self.params.arrival_radius_m = arrival_radius_m;
        Ok(())
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}
