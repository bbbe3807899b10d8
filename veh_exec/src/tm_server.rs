//! # TM Server
//!
//! Broadcasts a status packet to every subscriber of the status server on each odometry tick.
//! Subscribers only receive, anything they send is ignored.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use std::net::SocketAddr;

use comms_if::net::{Reactor, ReactorError};
use util::{maths::recursive_round, module::Module};

use crate::{
    coll_ctrl, controls, data_store::DataStore, exec::Link, head_ctrl, speed_ctrl, state,
    wp_ctrl
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of decimal places every number of a packet is rounded to.
pub const TM_DECIMAL_PLACES: u32 = 4;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    addr: SocketAddr
}

/// Telemetry packet that is output by the server.
#[derive(Debug, Serialize)]
pub struct TmPacket {
    pub state: state::StatusReport,
    pub controls: controls::StatusReport,
    pub speed_control: speed_ctrl::StatusReport,
    pub heading_control: head_ctrl::StatusReport,
    pub collision_control: coll_ctrl::StatusReport,
    pub waypoint_control: wp_ctrl::StatusReport
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server, listening on the given address.
    pub fn new(reactor: &mut Reactor<Link>, addr: &str) -> Result<Self, ReactorError> {
        let addr = reactor.listen(addr, Link::StatusClient)?;

        Ok(Self { addr })
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send a packet built from the data store to every subscriber, returning the number of
    /// subscribers it was queued for.
    pub fn send(&self, reactor: &mut Reactor<Link>, ds: &DataStore) -> Result<usize, TmServerError> {
        let line = TmPacket::from_datastore(ds).to_line()?;

        Ok(reactor.broadcast(Link::StatusClient, &line))
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            state: ds.state.status(),
            controls: ds.controls.status(),
            speed_control: ds.speed_ctrl.status(),
            heading_control: ds.head_ctrl.status(),
            collision_control: ds.coll_ctrl.status(),
            waypoint_control: ds.wp_ctrl.status()
        }
    }

    /// Serialize the packet into a single JSON line (without the newline), rounding every number.
    pub fn to_line(&self) -> Result<String, TmServerError> {
        let value = serde_json::to_value(self).map_err(TmServerError::SerializationError)?;

        serde_json::to_string(&recursive_round(value, TM_DECIMAL_PLACES))
            .map_err(TmServerError::SerializationError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::sim::OdometryMsg;
    use serde_json::{json, Value};

    #[test]
    fn test_packet_keys_and_rounding() {
        let mut ds = DataStore::default();
        ds.speed_ctrl.set_speed(1.0 / 3.0);
        ds.proc_odometry(&OdometryMsg { ds_m: 0.123_456 });

        let line = TmPacket::from_datastore(&ds).to_line().unwrap();
        assert!(!line.contains('\n'));

        let packet: Value = serde_json::from_str(&line).unwrap();

        for key in [
            "state", "controls", "speed_control", "heading_control", "collision_control",
            "waypoint_control"
        ].iter() {
            assert!(packet.get(key).is_some(), "Missing {}", key);
        }

        assert_eq!(packet["state"]["x"], json!(0.1235));
        assert_eq!(packet["state"]["time"], json!(0.1));
        assert_eq!(packet["state"]["lat"], Value::Null);
        assert_eq!(packet["speed_control"]["target_speed"], json!(0.3333));
        assert_eq!(packet["heading_control"]["enabled"], json!(false));
        assert_eq!(packet["collision_control"]["min_clearance"], Value::Null);
        assert_eq!(packet["waypoint_control"]["index"], json!(0));

        // Rounding an already rounded packet changes nothing
        assert_eq!(recursive_round(packet.clone(), TM_DECIMAL_PLACES), packet);
    }
}
