//! Implementations for the CollCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;

// Internal
use super::{CollCtrlError, Params};
use crate::controls::VehicleControls;
use comms_if::sim::RangeReading;
use util::module::Module;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Collision control module state
#[derive(Debug, Clone)]
pub struct CollCtrl {
    pub(crate) params: Params,

    /// The latest sweep
    readings: Vec<RangeReading>,

    /// Smallest considered reading of the latest sweep
    min_clearance: Option<f64>,

    /// True if the minimum clearance is below the safe distance
    blocked: bool,

    pub(crate) enabled: bool
}

/// Status report for CollCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub blocked: bool,
    pub min_clearance: Option<f64>,
    pub num_readings: usize,
    pub enabled: bool,
    pub safe_distance: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Module for CollCtrl {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        Self {
            enabled: params.enabled,
            params,
            readings: Vec::new(),
            min_clearance: None,
            blocked: false
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            blocked: self.is_blocked(),
            min_clearance: self.min_clearance,
            num_readings: self.readings.len(),
            enabled: self.enabled,
            safe_distance: self.params.safe_distance_m
        }
    }
}

impl CollCtrl {
    /// Store a new sweep and recompute the blocked state.
    pub fn update_range(&mut self, range_list: Vec<RangeReading>) {
        self.readings = range_list;

        let sector = self.params.sector_half_width_rad;

        self.min_clearance = self.readings
            .iter()
            .filter(|r| r.range().is_finite())
            .filter(|r| match (r.bearing(), sector) {
                (Some(b), Some(half_width)) => b.abs() <= half_width,
                _ => true
            })
            .map(|r| r.range())
            .fold(None, |min: Option<f64>, r| Some(min.map_or(r, |m| m.min(r))));

        self.recompute_blocked();
    }

    /// True if the vehicle must not move, always false while disabled.
    pub fn is_blocked(&self) -> bool {
        self.enabled && self.blocked
    }

    /// Force the vehicle to a stop: zero throttle and full brake.
    pub fn override_speed(&self, controls: &mut VehicleControls) {
        controls.set_throttle(0.0);
        controls.set_brake(controls.brake_max());
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn safe_distance(&self) -> f64 {
        self.params.safe_distance_m
    }

    /// Change the safe distance, the blocked state is re-evaluated against the latest sweep.
    pub fn set_safe_distance(&mut self, safe_distance_m: f64) -> Result<(), CollCtrlError> {
        if !safe_distance_m.is_finite() || safe_distance_m < 0.0 {
            return Err(CollCtrlError::InvalidSafeDistance(safe_distance_m))
        }

        self.params.safe_distance_m = safe_distance_m;
        self.recompute_blocked();

        Ok(())
    }

    fn recompute_blocked(&mut self) {
        let blocked = match self.min_clearance {
            Some(c) => c < self.params.safe_distance_m,
            None => false
        };

        if blocked != self.blocked {
            if blocked {
                info!(
                    "Collision control blocked, clearance {:?} m below {} m",
                    self.min_clearance,
                    self.params.safe_distance_m
                );
            }
            else {
                info!("Collision control clear");
            }
        }
        else {
            debug!("Minimum clearance {:?} m", self.min_clearance);
        }

        self.blocked = blocked;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::controls;

    fn coll_ctrl(sector_half_width_rad: Option<f64>) -> CollCtrl {
        CollCtrl::new(Params {
            safe_distance_m: 2.0,
            sector_half_width_rad,
            enabled: true
        })
    }

    #[test]
    fn test_blocked_threshold() {
        let mut cc = coll_ctrl(None);
        assert!(!cc.is_blocked());
        assert_eq!(cc.status().min_clearance, None);

        cc.update_range(vec![
            RangeReading::Distance(5.0),
            RangeReading::Polar(1.5, 0.1),
            RangeReading::Distance(f64::NAN)
        ]);
        assert!(cc.is_blocked());
        assert_eq!(cc.status().min_clearance, Some(1.5));
        assert_eq!(cc.status().num_readings, 3);

        // Exactly at the threshold is clear
        cc.update_range(vec![RangeReading::Distance(2.0)]);
        assert!(!cc.is_blocked());

        cc.update_range(vec![]);
        assert!(!cc.is_blocked());
        assert_eq!(cc.status().min_clearance, None);
    }

    #[test]
    fn test_sector_filter() {
        let mut cc = coll_ctrl(Some(0.5));

        cc.update_range(vec![RangeReading::Polar(0.5, 1.2), RangeReading::Distance(3.0)]);
        assert!(!cc.is_blocked());
        assert_eq!(cc.status().min_clearance, Some(3.0));

        cc.update_range(vec![RangeReading::Polar(0.5, -0.4)]);
        assert!(cc.is_blocked());
    }

    #[test]
    fn test_disable_and_safe_distance() {
        let mut cc = coll_ctrl(None);
        cc.update_range(vec![RangeReading::Distance(1.0)]);
        assert!(cc.is_blocked());

        cc.disable();
        assert!(!cc.is_blocked());
        assert!(!cc.status().blocked);
        cc.enable();
        assert!(cc.is_blocked());

        cc.set_safe_distance(0.5).unwrap();
        assert!(!cc.is_blocked());

        assert!(cc.set_safe_distance(-1.0).is_err());
        assert_eq!(cc.safe_distance(), 0.5);
    }

    #[test]
    fn test_override_speed() {
        let mut controls = VehicleControls::new(controls::Params::default());
        controls.set_throttle(0.7);

        coll_ctrl(None).override_speed(&mut controls);

        assert_eq!(controls.throttle(), 0.0);
        assert_eq!(controls.brake(), 1.0);
    }
}
