//! Adapter turning simulator pose records into GPS and compass fixes

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{CompassMsg, GpsMsg, PoseMsg};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Converts successive pose records into the equivalent GPS and compass messages.
///
/// The pose's `x`, `y` and `z` are reported as longitude, latitude and altitude respectively, and
/// the yaw as the heading. Pose records carry no speed, so it is estimated from the distance
/// between successive timestamped records.
#[derive(Debug, Clone, Default)]
pub struct PoseAdapter {
    prev: Option<(f64, f64, f64)>,
    speed: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a pose record into a GPS and a compass message.
    pub fn pose_message(&mut self, pose: &PoseMsg) -> (GpsMsg, CompassMsg) {
        if let Some(t) = pose.timestamp {
            if let Some((prev_t, prev_x, prev_y)) = self.prev {
                let dt = t - prev_t;

                if dt > 0.0 {
                    self.speed = (pose.x - prev_x).hypot(pose.y - prev_y) / dt;
                }
            }

            self.prev = Some((t, pose.x, pose.y));
        }

        let gps = GpsMsg {
            lat: pose.y,
            lon: pose.x,
            alt: pose.z,
            speed: self.speed,
            heading: pose.yaw
        };

        let compass = CompassMsg { heading: pose.yaw };

        (gps, compass)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pose(x: f64, y: f64, yaw: f64, timestamp: Option<f64>) -> PoseMsg {
        PoseMsg { x, y, z: 0.5, yaw, pitch: 0.0, roll: 0.0, timestamp }
    }

    #[test]
    fn test_pose_message() {
        let mut adapter = PoseAdapter::new();

        let (gps, compass) = adapter.pose_message(&pose(1.0, 2.0, 0.3, Some(0.0)));
        assert_eq!(gps.lon, 1.0);
        assert_eq!(gps.lat, 2.0);
        assert_eq!(gps.alt, 0.5);
        assert_eq!(gps.heading, 0.3);
        assert_eq!(gps.speed, 0.0);
        assert_eq!(compass.heading, 0.3);

        let (gps, _) = adapter.pose_message(&pose(4.0, 6.0, 0.3, Some(2.0)));
        assert!((gps.speed - 2.5).abs() < 1e-12);

        // Repeated timestamps keep the previous estimate
        let (gps, _) = adapter.pose_message(&pose(5.0, 6.0, 0.3, Some(2.0)));
        assert!((gps.speed - 2.5).abs() < 1e-12);

        // No timestamp, no estimate update
        let (gps, _) = adapter.pose_message(&pose(50.0, 6.0, 0.3, None));
        assert!((gps.speed - 2.5).abs() < 1e-12);
    }
}
