//! # Data Store
//!
//! The data store owns the vehicle state, the controls and every controller, and implements the
//! processing sequence run on receipt of each simulator message. Processing is message driven,
//! only odometry advances time and produces motion demands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::{
    CompassMsg, GpsMsg, MotionDems, OdometryMsg, PoseAdapter, PoseMsg, RangeMsg
};
use log::trace;
use util::{module::Module, params::LoadError};

use crate::{
    coll_ctrl::{self, CollCtrl},
    controls::{self, VehicleControls},
    head_ctrl::{self, HeadCtrl},
    speed_ctrl::{self, SpeedCtrl},
    state::{self, VehicleState},
    wp_ctrl::{self, WpCtrl}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Fixed integration step of an odometry message.
///
/// Units: seconds
pub const ODOMETRY_DT_S: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Debug, Clone)]
pub struct DataStore {
    pub state: VehicleState,
    pub controls: VehicleControls,
    pub speed_ctrl: SpeedCtrl,
    pub head_ctrl: HeadCtrl,
    pub coll_ctrl: CollCtrl,
    pub wp_ctrl: WpCtrl,

    /// Converts pose records into fixes
    pub pose_adapter: PoseAdapter,

    /// Number of odometry ticks processed
    pub num_ticks: u64
}

/// A module's parameter file could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("Could not load {file}: {source}")]
pub struct InitError {
    pub file: &'static str,
    pub source: LoadError
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl Default for DataStore {
    fn default() -> Self {
        Self {
            state: VehicleState::new(state::Params::default()),
            controls: VehicleControls::new(controls::Params::default()),
            speed_ctrl: SpeedCtrl::new(speed_ctrl::Params::default()),
            head_ctrl: HeadCtrl::new(head_ctrl::Params::default()),
            coll_ctrl: CollCtrl::new(coll_ctrl::Params::default()),
            wp_ctrl: WpCtrl::new(wp_ctrl::Params::default()),
            pose_adapter: PoseAdapter::new(),
            num_ticks: 0
        }
    }
}

impl DataStore {
    /// Initialise every module from its parameter file.
    pub fn init() -> Result<Self, InitError> {
        Ok(Self {
            state: init_module("state.toml")?,
            controls: init_module("controls.toml")?,
            speed_ctrl: init_module("speed_ctrl.toml")?,
            head_ctrl: init_module("head_ctrl.toml")?,
            coll_ctrl: init_module("coll_ctrl.toml")?,
            wp_ctrl: init_module("wp_ctrl.toml")?,
            pose_adapter: PoseAdapter::new(),
            num_ticks: 0
        })
    }

    /// Process an odometry increment, returning the motion demands to send.
    pub fn proc_odometry(&mut self, msg: &OdometryMsg) -> MotionDems {
        self.state.update_time(ODOMETRY_DT_S);
        self.state.update_odometry(msg.ds_m, ODOMETRY_DT_S);

        self.speed_ctrl.update(&self.state, &self.coll_ctrl, &mut self.controls);

        self.num_ticks += 1;
        trace!("Odometry tick {} at t = {:.1} s", self.num_ticks, self.state.t);

        self.controls.motion_dems()
    }

    pub fn proc_gps(&mut self, msg: &GpsMsg) {
        self.apply_gps(msg);
        self.wp_ctrl.update(&self.state, &self.coll_ctrl, &mut self.head_ctrl);
    }

    pub fn proc_compass(&mut self, msg: &CompassMsg) {
        self.state.update_compass(msg.heading);
        self.head_ctrl.update(&self.state, &self.coll_ctrl, &mut self.controls);
    }

    /// Store a ranging sweep. The effect is seen on the next speed or heading update.
    pub fn proc_range(&mut self, msg: RangeMsg) {
        self.coll_ctrl.update_range(msg.range_list);
    }

    /// Process a pose record, applied as a GPS fix followed by a compass fix.
    pub fn proc_pose(&mut self, msg: &PoseMsg) {
        let (gps, compass) = self.pose_adapter.pose_message(msg);

        self.apply_gps(&gps);
        self.state.update_compass(compass.heading);

        self.wp_ctrl.update(&self.state, &self.coll_ctrl, &mut self.head_ctrl);
        self.head_ctrl.update(&self.state, &self.coll_ctrl, &mut self.controls);
    }

    fn apply_gps(&mut self, msg: &GpsMsg) {
        self.state.update_gps(msg.lat, msg.lon, msg.alt, msg.speed, msg.heading);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn init_module<M: Module>(file: &'static str) -> Result<M, InitError> {
    M::init(file).map_err(|source| InitError { file, source })
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::sim::RangeReading;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_odometry_sequence() {
        let mut ds = DataStore::default();
        ds.speed_ctrl.set_speed(20.0);

        let dems = ds.proc_odometry(&OdometryMsg { ds_m: 1.0 });

        assert_eq!(ds.state.x, 1.0);
        assert_eq!(ds.state.speed, 10.0);
        assert_eq!(ds.state.t, ODOMETRY_DT_S);
        assert_eq!(ds.num_ticks, 1);

        // Error of 10 m/s saturates the throttle, sent with the simulator's polarity
        assert_eq!(dems.force, -1.0);
        assert_eq!(dems.brake, 0.0);
    }

    #[test]
    fn test_range_takes_effect_on_next_tick() {
        let mut ds = DataStore::default();
        ds.speed_ctrl.set_speed(1.0);
        ds.proc_odometry(&OdometryMsg { ds_m: 0.0 });
        assert!(ds.controls.throttle() > 0.0);

        ds.proc_range(RangeMsg { range_list: vec![RangeReading::Distance(0.1)] });
        assert!(ds.controls.throttle() > 0.0);

        let dems = ds.proc_odometry(&OdometryMsg { ds_m: 0.0 });
        assert_eq!(dems.force, 0.0);
        assert_eq!(dems.brake, ds.controls.brake_max());
    }

    #[test]
    fn test_pose_drives_waypoints_and_heading() {
        let mut ds = DataStore::default();
        ds.wp_ctrl.set_route(vec![[0.0, 10.0]]).unwrap();
        ds.wp_ctrl.enable();
        ds.head_ctrl.enable();

        ds.proc_pose(&PoseMsg {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            timestamp: Some(1.0)
        });

        assert!((ds.head_ctrl.target_heading - FRAC_PI_2).abs() < 1e-12);
        // Gain of 1 saturates the steer demand at the limit
        assert_eq!(ds.controls.steer(), 1.0);
        assert_eq!(ds.state.status().lat, Some(0.0));
    }

    #[test]
    fn test_gps_and_compass_independent() {
        let mut ds = DataStore::default();

        ds.proc_compass(&CompassMsg { heading: 0.3 });
        ds.proc_gps(&GpsMsg { lat: 4.0, lon: 2.0, alt: 0.0, speed: 1.0, heading: 2.5 });

        assert_eq!(ds.state.yaw, 0.3);
        assert_eq!((ds.state.x, ds.state.y), (2.0, 4.0));
    }
}
