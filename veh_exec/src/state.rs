//! # Vehicle state
//!
//! Fused kinematic estimate of the vehicle. Position is dead-reckoned from odometry increments
//! along the current yaw, and overwritten wholesale whenever an absolute fix arrives. Yaw is owned
//! by the compass, the heading reported with a GPS fix is kept separately.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::{maths::wrap_pi, module::Module};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mean radius of the earth used by the equirectangular projection.
///
/// Units: meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the vehicle state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    /// How absolute fixes map onto the local planar frame
    #[serde(default)]
    pub fix_projection: FixProjection
}

/// The fused vehicle state.
#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    params: Params,

    /// Simulated time, advanced only by odometry ticks.
    ///
    /// Units: seconds
    pub t: f64,

    /// Position in the local frame.
    ///
    /// Units: meters
    pub x: f64,
    pub y: f64,

    /// Heading in the local frame, always in `(-pi, pi]`.
    ///
    /// Units: radians
    pub yaw: f64,

    /// Estimated speed.
    ///
    /// Units: meters/second
    pub speed: f64,

    /// The last absolute fix, `None` until one arrives
    pub fix: Option<GpsFix>
}

/// An absolute position fix as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub speed: f64,
    pub heading: f64
}

/// Status report of the vehicle state.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    pub speed: f64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    pub gps_speed: Option<f64>,
    pub gps_heading: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Projection of absolute fixes onto the local planar frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum FixProjection {
    /// Fixes are already planar, `x = lon` and `y = lat`. This is how simulated fixes are
    /// reported.
    Planar,

    /// Geodetic fixes in degrees, projected about the given origin.
    Equirectangular {
        origin_lat_deg: f64,
        origin_lon_deg: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FixProjection {
    fn default() -> Self {
        FixProjection::Planar
    }
}

impl FixProjection {
    /// Project a fix into the local frame, returning `(x, y)`.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        match *self {
            FixProjection::Planar => (lon, lat),
            FixProjection::Equirectangular { origin_lat_deg, origin_lon_deg } => {
                let x = EARTH_RADIUS_M
                    * (lon - origin_lon_deg).to_radians()
                    * origin_lat_deg.to_radians().cos();
                let y = EARTH_RADIUS_M * (lat - origin_lat_deg).to_radians();

                (x, y)
            }
        }
    }
}

impl Module for VehicleState {
    type Params = Params;
    type StatusReport = StatusReport;

    fn new(params: Self::Params) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    fn status(&self) -> StatusReport {
        StatusReport {
            time: self.t,
            x: self.x,
            y: self.y,
            yaw: self.yaw,
            speed: self.speed,
            lat: self.fix.map(|f| f.lat),
            lon: self.fix.map(|f| f.lon),
            alt: self.fix.map(|f| f.alt),
            gps_speed: self.fix.map(|f| f.speed),
            gps_heading: self.fix.map(|f| f.heading)
        }
    }
}

impl VehicleState {
    /// Advance simulated time.
    pub fn update_time(&mut self, dt: f64) {
        // Time never runs backwards
        if dt > 0.0 {
            self.t += dt;
        }
    }

    /// Integrate an arc-length increment along the current heading.
    ///
    /// The speed estimate is left unchanged if `dt` is not positive.
    pub fn update_odometry(&mut self, ds: f64, dt: f64) {
        self.x += ds * self.yaw.cos();
        self.y += ds * self.yaw.sin();

        if dt > 0.0 {
            self.speed = ds / dt;
        }
    }

    /// Apply an absolute position fix.
    ///
    /// Overwrites the position, through the configured projection, and the speed estimate. Yaw
    /// is not touched.
    pub fn update_gps(&mut self, lat: f64, lon: f64, alt: f64, speed: f64, heading: f64) {
        let (x, y) = self.params.fix_projection.project(lat, lon);

        self.x = x;
        self.y = y;
        self.speed = speed;
        self.fix = Some(GpsFix { lat, lon, alt, speed, heading });
    }

    /// Apply an absolute heading fix.
    pub fn update_compass(&mut self, heading: f64) {
        self.yaw = wrap_pi(heading);
    }

    /// Set the yaw directly, normalised into `(-pi, pi]`.
    pub fn set_yaw(&mut self, yaw: f64) {
        self.yaw = wrap_pi(yaw);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_dead_reckoning() {
        let mut state = VehicleState::default();

        state.update_time(0.1);
        state.update_odometry(1.0, 0.1);

        assert_eq!(state.x, 1.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.speed, 10.0);
        assert_eq!(state.yaw, 0.0);
        assert_eq!(state.t, 0.1);

        state.update_compass(PI / 2.0);
        state.update_odometry(2.0, 0.1);

        assert!((state.x - 1.0).abs() < 1e-12);
        assert!((state.y - 2.0).abs() < 1e-12);
        assert!((state.speed - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dt_keeps_speed() {
        let mut state = VehicleState::default();

        state.update_odometry(1.0, 0.1);
        state.update_odometry(1.0, 0.0);
        state.update_time(-1.0);

        assert_eq!(state.x, 2.0);
        assert_eq!(state.speed, 10.0);
        assert_eq!(state.t, 0.0);
    }

    #[test]
    fn test_compass_wraps() {
        let mut state = VehicleState::default();

        state.update_compass(3.0 * PI);
        assert!((state.yaw - PI).abs() < 1e-12);

        state.update_compass(-PI);
        assert_eq!(state.yaw, PI);

        state.update_compass(-0.5);
        assert_eq!(state.yaw, -0.5);
    }

    #[test]
    fn test_gps_overwrites_position_not_yaw() {
        let mut state = VehicleState::default();
        state.update_compass(0.4);
        state.update_odometry(5.0, 0.1);

        state.update_gps(2.0, 3.0, 0.1, 1.5, -1.0);

        assert_eq!((state.x, state.y), (3.0, 2.0));
        assert_eq!(state.speed, 1.5);
        assert_eq!(state.yaw, 0.4);

        let status = state.status();
        assert_eq!(status.gps_heading, Some(-1.0));
        assert_eq!(status.alt, Some(0.1));
    }

    #[test]
    fn test_status_before_fix() {
        let status = VehicleState::default().status();

        assert!(status.lat.is_none());
        assert!(status.gps_heading.is_none());
    }

    #[test]
    fn test_equirectangular_projection() {
        let params: Params = util::params::from_str(
            r#"
            [fix_projection]
            type = "Equirectangular"
            origin_lat_deg = 0.0
            origin_lon_deg = 10.0
            "#
        ).unwrap();

        let mut state = VehicleState::new(params);
        state.update_gps(1.0, 10.0, 0.0, 0.0, 0.0);

        assert!(state.x.abs() < 1e-6);
        assert!((state.y - EARTH_RADIUS_M * 1f64.to_radians()).abs() < 1e-6);
    }
}
