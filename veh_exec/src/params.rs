//! # Vehicle Executable Parameters
//!
//! This module provides the network parameters of the vehicle executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{net::ReactorParams, sim::StreamKind};
use serde::Deserialize;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Host running the simulator
    pub sim_host: String,

    /// Port of the simulator's service link
    pub service_port: u16,

    /// Address the status server binds to
    pub status_server_addr: String,

    /// Address the command server binds to
    pub command_server_addr: String,

    /// Delay before redialling a dropped stream link. Stream links are not redialled if unset.
    ///
    /// Units: seconds
    #[serde(default)]
    pub stream_reconnect_s: Option<f64>,

    /// Streams requested from the simulator
    #[serde(default = "default_streams")]
    pub streams: Vec<StreamParams>,

    #[serde(default)]
    pub reactor: ReactorParams
}

/// A stream requested from the simulator.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamParams {
    pub kind: StreamKind,

    /// Name of the simulator component providing the stream
    pub component: String
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NetParams {
    /// Address of the simulator's service link.
    pub fn service_addr(&self) -> String {
        format!("{}:{}", self.sim_host, self.service_port)
    }

    /// Redial delay of stream links, if enabled.
    pub fn stream_reconnect(&self) -> Option<Duration> {
        self.stream_reconnect_s
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

impl StreamParams {
    pub fn new(kind: StreamKind, component: &str) -> Self {
        Self {
            kind,
            component: component.to_string()
        }
    }
}

fn default_streams() -> Vec<StreamParams> {
    vec![
        StreamParams::new(StreamKind::Motion, "robot.motion"),
        StreamParams::new(StreamKind::Range, "robot.scanner"),
        StreamParams::new(StreamKind::Odometry, "robot.odometry"),
        StreamParams::new(StreamKind::Pose, "robot.pose"),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_net_params() {
        let params: NetParams = util::params::from_str(
            r#"
            sim_host = "localhost"
            service_port = 4000
            status_server_addr = "0.0.0.0:60212"
            command_server_addr = "0.0.0.0:60213"
            "#
        ).unwrap();

        assert_eq!(params.service_addr(), "localhost:4000");
        assert_eq!(params.stream_reconnect(), None);
        assert_eq!(
            params.streams.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![StreamKind::Motion, StreamKind::Range, StreamKind::Odometry, StreamKind::Pose]
        );
        assert_eq!(params.reactor.idle_sleep_ms, 1);

        let params: NetParams = util::params::from_str(
            r#"
            sim_host = "127.0.0.1"
            service_port = 4000
            status_server_addr = "0.0.0.0:60212"
            command_server_addr = "0.0.0.0:60213"
            stream_reconnect_s = 0.5

            [[streams]]
            kind = "gps"
            component = "robot.gps"

            [reactor]
            idle_sleep_ms = 5
            "#
        ).unwrap();

        assert_eq!(params.stream_reconnect(), Some(Duration::from_millis(500)));
        assert_eq!(params.streams[0].kind, StreamKind::Gps);
        assert_eq!(params.reactor.idle_sleep_ms, 5);
        assert_eq!(params.reactor.max_line_len, 64 * 1024);
    }
}
