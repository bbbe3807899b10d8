//! # Simulator stream messages
//!
//! Each stream link carries one JSON object per line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The sensor and actuator streams offered by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Actuator commands, send only
    Motion,

    /// Ranging sensor sweeps
    Range,

    /// Arc-length odometry deltas
    Odometry,

    /// Absolute position fixes
    Gps,

    /// Absolute heading fixes
    Compass,

    /// Combined position and attitude fixes
    Pose
}

/// A single reading of a ranging sweep.
///
/// Sensors either report a bare distance or a `[range, bearing]` pair, with the bearing in radians
/// relative to the vehicle's forward axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeReading {
    Distance(f64),
    Polar(f64, f64)
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the simulator's motion actuator.
///
/// The simulator's convention is positive steer to the left and positive force backwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionDems {
    pub steer: f64,
    pub force: f64,
    pub brake: f64
}

/// Odometry increment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryMsg {
    /// Distance travelled along the current heading since the last message, in meters
    #[serde(rename = "dS")]
    pub ds_m: f64
}

/// A sweep from the ranging sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeMsg {
    pub range_list: Vec<RangeReading>
}

/// An absolute position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsMsg {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub speed: f64,
    pub heading: f64
}

/// An absolute heading fix, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompassMsg {
    pub heading: f64
}

/// The simulator's combined pose record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMsg {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub yaw: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,

    /// Simulation time of the record, in seconds
    #[serde(default)]
    pub timestamp: Option<f64>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StreamKind {
    /// All stream kinds.
    pub const ALL: [StreamKind; 6] = [
        StreamKind::Motion,
        StreamKind::Range,
        StreamKind::Odometry,
        StreamKind::Gps,
        StreamKind::Compass,
        StreamKind::Pose
    ];

    /// Short lowercase name of the stream.
    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Motion => "motion",
            StreamKind::Range => "range",
            StreamKind::Odometry => "odometry",
            StreamKind::Gps => "gps",
            StreamKind::Compass => "compass",
            StreamKind::Pose => "pose"
        }
    }

    /// Identifier used for the service request asking for this stream's port.
    pub fn port_request_id(&self) -> String {
        format!("{}_port", self.name())
    }

    /// Get the stream kind from a port request identifier.
    pub fn from_port_request_id(id: &str) -> Option<Self> {
        let name = id.strip_suffix("_port")?;

        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl RangeReading {
    /// Measured distance of the reading.
    pub fn range(&self) -> f64 {
        match self {
            RangeReading::Distance(r) => *r,
            RangeReading::Polar(r, _) => *r
        }
    }

    /// Bearing of the reading, if the sensor reports one.
    pub fn bearing(&self) -> Option<f64> {
        match self {
            RangeReading::Distance(_) => None,
            RangeReading::Polar(_, b) => Some(*b)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_port_request_id() {
        for kind in StreamKind::ALL.iter() {
            assert_eq!(
                StreamKind::from_port_request_id(&kind.port_request_id()),
                Some(*kind)
            );
        }

        assert_eq!(StreamKind::from_port_request_id("odometry"), None);
        assert_eq!(StreamKind::from_port_request_id("lidar_port"), None);
    }

    #[test]
    fn test_parse_streams() {
        let odo: OdometryMsg = serde_json::from_str(r#"{"dS": 0.25}"#).unwrap();
        assert_eq!(odo.ds_m, 0.25);

        let range: RangeMsg =
            serde_json::from_str(r#"{"range_list": [3.0, [1.5, -0.2], 30]}"#).unwrap();
        assert_eq!(
            range.range_list,
            vec![
                RangeReading::Distance(3.0),
                RangeReading::Polar(1.5, -0.2),
                RangeReading::Distance(30.0)
            ]
        );

        let pose: PoseMsg =
            serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "yaw": 0.5, "timestamp": 10.0}"#)
                .unwrap();
        assert_eq!(pose.z, 0.0);
        assert_eq!(pose.timestamp, Some(10.0));

        assert!(serde_json::from_str::<GpsMsg>(r#"{"lat": 1.0}"#).is_err());
    }

    #[test]
    fn test_motion_json() {
        let dems = MotionDems { steer: -0.2, force: -0.5, brake: 0.0 };

        assert_eq!(
            serde_json::to_string(&dems).unwrap(),
            r#"{"steer":-0.2,"force":-0.5,"brake":0.0}"#
        );
    }
}
