//! # Telecommand module
//!
//! This module provides the telecommand protocol spoken by the vehicle's command server. A
//! telecommand is a single line holding a JSON array:
//!
//! ```text
//! [action, component_name, field_or_operation_name, params]
//! ```
//!
//! where `action` is either `"set"` (assign `params` to a field) or `"call"` (invoke an operation
//! with `params` as a positional list or a named-parameter mapping). The server replies with a
//! single line, either `OK` or `ERROR: <reason>`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, json, Value};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The reply sent for a successfully executed telecommand.
pub const OK_REPLY: &str = "OK";

/// Prefix of the reply sent for a rejected or failed telecommand.
pub const ERROR_REPLY_PREFIX: &str = "ERROR: ";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the vehicle by an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Tc {
    /// What to do with the target
    pub action: TcAction,

    /// Name of the component the command is addressed to, e.g. `speed_control`
    pub component: String,

    /// Name of the field to set or the operation to call
    pub name: String,

    /// The value to set, or the arguments of the call
    pub params: Value
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The action requested by a telecommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcAction {
    /// Assign the params to a named field
    Set,

    /// Invoke a named operation with the params as arguments
    Call
}

/// Response to a telecommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcResponse {
    /// The telecommand was executed
    Ok,

    /// The telecommand was rejected or failed, with the reason
    Error(String)
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("Client message is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {

    /// Parse a new TC from a JSON line
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let val: Value = serde_json::from_str(json_str)
            .map_err(TcParseError::InvalidJson)?;

        // Must be exactly [action, component, name, params]
        let mut items = match val {
            Value::Array(a) if a.len() == 4 => a,
            v => return Err(TcParseError::InvalidMessage(v.to_string()))
        };

        let params = items.pop().unwrap_or(Value::Null);
        let name = match items.pop() {
            Some(Value::String(s)) => s,
            v => return Err(TcParseError::InvalidMessage(format!(
                "expected the field or operation name to be a string, found {}",
                v.unwrap_or(Value::Null)
            )))
        };
        let component = match items.pop() {
            Some(Value::String(s)) => s,
            v => return Err(TcParseError::InvalidMessage(format!(
                "expected the component name to be a string, found {}",
                v.unwrap_or(Value::Null)
            )))
        };
        let action = match items.pop() {
            Some(Value::String(s)) => TcAction::from_str(&s)
                .ok_or(TcParseError::UnknownAction(s))?,
            v => return Err(TcParseError::UnknownAction(v.unwrap_or(Value::Null).to_string()))
        };

        Ok(Tc {
            action,
            component,
            name,
            params
        })
    }

    /// Serialize the TC into its JSON line form (without the newline).
    pub fn to_json(&self) -> String {
        json!([self.action, self.component, self.name, self.params]).to_string()
    }
}

impl TcAction {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "set" => Some(TcAction::Set),
            "call" => Some(TcAction::Call),
            _ => None
        }
    }
}

impl TcResponse {
    /// Parse a response line sent by the command server.
    ///
    /// Anything that isn't `OK` is treated as an error, with the `ERROR: ` prefix stripped if
    /// present.
    pub fn from_line(line: &str) -> Self {
        let line = line.trim_end();

        if line == OK_REPLY {
            TcResponse::Ok
        }
        else {
            TcResponse::Error(
                line.strip_prefix(ERROR_REPLY_PREFIX).unwrap_or(line).to_string()
            )
        }
    }

    /// True if the response is `Ok`.
    pub fn is_ok(&self) -> bool {
        *self == TcResponse::Ok
    }
}

impl fmt::Display for TcResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TcResponse::Ok => write!(f, "{}", OK_REPLY),
            TcResponse::Error(reason) => write!(f, "{}{}", ERROR_REPLY_PREFIX, reason)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_set() {
        let tc = Tc::from_json(r#"["set", "speed_control", "target_speed", 5.0]"#).unwrap();

        assert_eq!(tc.action, TcAction::Set);
        assert_eq!(tc.component, "speed_control");
        assert_eq!(tc.name, "target_speed");
        assert_eq!(tc.params, json!(5.0));
    }

    #[test]
    fn test_parse_call_named() {
        let tc = Tc::from_json(
            r#"["call", "waypoint_control", "add_waypoint", {"x": 1.0, "y": 2.0}]"#
        ).unwrap();

        assert_eq!(tc.action, TcAction::Call);
        assert_eq!(tc.params["y"], json!(2.0));
    }

    #[test]
    fn test_parse_errors() {
        match Tc::from_json("[\"set\", ") {
            Err(TcParseError::InvalidJson(_)) => (),
            r => panic!("Expected invalid JSON, got {:?}", r)
        }

        match Tc::from_json(r#"["set", "speed_control", "target_speed"]"#) {
            Err(TcParseError::InvalidMessage(_)) => (),
            r => panic!("Expected invalid message, got {:?}", r)
        }

        match Tc::from_json(r#"{"action": "set"}"#) {
            Err(TcParseError::InvalidMessage(_)) => (),
            r => panic!("Expected invalid message, got {:?}", r)
        }

        match Tc::from_json(r#"["get", "speed_control", "target_speed", null]"#) {
            Err(TcParseError::UnknownAction(a)) => assert_eq!(a, "get"),
            r => panic!("Expected unknown action, got {:?}", r)
        }

        match Tc::from_json(r#"["set", 4, "target_speed", 1.0]"#) {
            Err(TcParseError::InvalidMessage(_)) => (),
            r => panic!("Expected invalid message, got {:?}", r)
        }
    }

    #[test]
    fn test_to_json() {
        let tc = Tc {
            action: TcAction::Call,
            component: "heading_control".into(),
            name: "set_heading".into(),
            params: json!([1.2])
        };

        assert_eq!(tc.to_json(), r#"["call","heading_control","set_heading",[1.2]]"#);
        assert_eq!(Tc::from_json(&tc.to_json()).unwrap(), tc);
    }

    #[test]
    fn test_response() {
        assert_eq!(TcResponse::Ok.to_string(), "OK");
        assert_eq!(
            TcResponse::Error("Unknown action: get".into()).to_string(),
            "ERROR: Unknown action: get"
        );
        assert_eq!(TcResponse::from_line("OK\n"), TcResponse::Ok);
        assert_eq!(
            TcResponse::from_line("ERROR: bad"),
            TcResponse::Error("bad".into())
        );
    }
}
