//! # Simulator interface
//!
//! The simulator exposes a service link, over which the vehicle asks for the ports of the
//! individual sensor and actuator streams, and one stream link per sensor/actuator.
//!
//! Service requests and replies are single text lines:
//!
//! ```text
//! <id> <component> <message> <json-array-of-args>
//! <id> <SUCCESS|FAILURE> <payload>
//! ```
//!
//! Stream links carry one JSON object per line, see [`streams`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod pose;
mod streams;

pub use pose::PoseAdapter;
pub use streams::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use conquer_once::Lazy;
use regex::Regex;
use serde_json::{json, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Simulator component which answers stream port requests.
pub const SIMULATION_COMPONENT: &str = "simulation";

/// Service message asking for the port of a sensor/actuator stream.
pub const GET_STREAM_PORT_MESSAGE: &str = "get_stream_port";

/// Status word of a successful service reply.
pub const SUCCESS_STATUS: &str = "SUCCESS";

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

static REPLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<id>\w+) (?P<status>\w+)(?: (?P<data>.*))?$")
        .expect("Service reply regex is invalid")
});

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A request sent to the simulator service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    /// Identifier echoed back in the reply
    pub id: String,

    /// Simulator component the request is addressed to
    pub component: String,

    /// The message (method) to invoke on the component
    pub message: String,

    /// Arguments of the message
    pub args: Vec<Value>
}

/// A reply from the simulator service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    /// Identifier of the request this replies to
    pub id: String,

    /// True if the status word was `SUCCESS`
    pub success: bool,

    /// Raw reply payload
    pub payload: String
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ServiceReplyError {
    #[error("Invalid service message: {0}")]
    InvalidReply(String),

    #[error("Service reply payload is not a valid port: {0}")]
    InvalidPort(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ServiceRequest {
    /// Build a request for the port of the stream of the given simulator component.
    pub fn get_stream_port(id: &str, sensor_name: &str) -> Self {
        Self {
            id: id.to_string(),
            component: SIMULATION_COMPONENT.to_string(),
            message: GET_STREAM_PORT_MESSAGE.to_string(),
            args: vec![json!(sensor_name)]
        }
    }

    /// Format the request as a line (without the newline).
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.id,
            self.component,
            self.message,
            Value::Array(self.args.clone())
        )
    }
}

impl ServiceReply {
    /// Parse a reply line from the service.
    pub fn from_line(line: &str) -> Result<Self, ServiceReplyError> {
        let caps = REPLY_REGEX
            .captures(line.trim_end())
            .ok_or_else(|| ServiceReplyError::InvalidReply(line.to_string()))?;

        // id and status are not optional in the regex so will always be present
        let id = caps.name("id").map(|m| m.as_str()).unwrap_or_default();
        let status = caps.name("status").map(|m| m.as_str()).unwrap_or_default();
        let payload = caps.name("data").map(|m| m.as_str()).unwrap_or_default();

        Ok(Self {
            id: id.to_string(),
            success: status == SUCCESS_STATUS,
            payload: payload.to_string()
        })
    }

    /// Interpret the payload as a port number.
    pub fn port(&self) -> Result<u16, ServiceReplyError> {
        self.payload
            .trim()
            .parse()
            .map_err(|_| ServiceReplyError::InvalidPort(self.payload.clone()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_line() {
        let req = ServiceRequest::get_stream_port("motion_port", "robot.motion");

        assert_eq!(
            req.to_line(),
            "motion_port simulation get_stream_port [\"robot.motion\"]"
        );
    }

    #[test]
    fn test_parse_reply() {
        let reply = ServiceReply::from_line("odometry_port SUCCESS 60001\n").unwrap();
        assert_eq!(reply.id, "odometry_port");
        assert!(reply.success);
        assert_eq!(reply.port().unwrap(), 60001);

        let reply = ServiceReply::from_line("pose_port FAILURE no such component").unwrap();
        assert!(!reply.success);
        assert_eq!(reply.payload, "no such component");

        let reply = ServiceReply::from_line("pose_port SUCCESS").unwrap();
        assert_eq!(reply.payload, "");
        assert!(reply.port().is_err());
    }

    #[test]
    fn test_parse_invalid_reply() {
        assert!(ServiceReply::from_line("garbage").is_err());
        assert!(ServiceReply::from_line("").is_err());
        assert!(ServiceReply::from_line("a-b SUCCESS 1").is_err());
    }
}
