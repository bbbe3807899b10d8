//! # Telecommand processor module
//!
//! The telecommand processor executes telecommands received by the command server against the
//! data store. Each component exposes a fixed set of settable fields and callable operations,
//! gathered once into a [`TcRegistry`] keyed by `(component, name)`.
//!
//! Operations declare their parameter names, so a call's arguments may be given either as a
//! positional list or as a mapping from parameter name to value.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

// Internal
use crate::data_store::DataStore;
use comms_if::tc::{Tc, TcAction, TcResponse};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Assigns a value to a field.
pub type SetFn = fn(&mut DataStore, Value) -> Result<(), TcError>;

/// Invokes an operation with its positional arguments, already checked for arity.
pub type CallFn = fn(&mut DataStore, Vec<Value>) -> Result<(), TcError>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Registry of every field and operation reachable by telecommand.
pub struct TcRegistry {
    components: HashMap<&'static str, HashMap<&'static str, TcEntry>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A registered target.
#[derive(Clone, Copy)]
pub enum TcEntry {
    Field(SetFn),
    Op {
        params: &'static [&'static str],
        invoke: CallFn
    }
}

/// Errors raised while executing a telecommand.
#[derive(Debug, Error)]
pub enum TcError {
    #[error("Invalid message recipient: no component named '{0}'")]
    UnknownComponent(String),

    #[error("Invalid message recipient: '{0}' has no field or operation named '{1}'")]
    UnknownName(String, String),

    #[error("Invalid message attempted to set a callable object.")]
    SetOperation,

    #[error("Invalid message attempted to call a non-callable object.")]
    CallField,

    #[error("Invalid message params: {0}")]
    InvalidParams(String),

    #[error("Call message caused an exception: {0}")]
    CallFailed(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TcRegistry {
    /// Build the registry of every component.
    pub fn new() -> Self {
        let mut reg = Self {
            components: HashMap::new()
        };

        reg.register_state();
        reg.register_controls();
        reg.register_speed_ctrl();
        reg.register_head_ctrl();
        reg.register_coll_ctrl();
        reg.register_wp_ctrl();

        reg
    }

    /// Look up a target.
    pub fn get(&self, component: &str, name: &str) -> Result<TcEntry, TcError> {
        let entries = self.components
            .get(component)
            .ok_or_else(|| TcError::UnknownComponent(component.to_string()))?;

        entries
            .get(name)
            .copied()
            .ok_or_else(|| TcError::UnknownName(component.to_string(), name.to_string()))
    }

    /// Execute a telecommand against the data store.
    pub fn exec(&self, ds: &mut DataStore, tc: &Tc) -> Result<(), TcError> {
        let entry = self.get(&tc.component, &tc.name)?;

        match (tc.action, entry) {
            (TcAction::Set, TcEntry::Field(set)) => set(ds, tc.params.clone()),
            (TcAction::Set, TcEntry::Op { .. }) => Err(TcError::SetOperation),
            (TcAction::Call, TcEntry::Op { params, invoke }) => {
                invoke(ds, positional_args(params, tc.params.clone())?)
            },
            (TcAction::Call, TcEntry::Field(_)) => Err(TcError::CallField)
        }
    }

    /// Parse and execute a telecommand line, producing the reply for the client.
    pub fn exec_line(&self, ds: &mut DataStore, line: &str) -> TcResponse {
        let result = match Tc::from_json(line) {
            Ok(tc) => {
                debug!("Executing TC: {:?}", tc);
                self.exec(ds, &tc).map_err(|e| e.to_string())
            },
            Err(e) => Err(e.to_string())
        };

        match result {
            Ok(()) => TcResponse::Ok,
            Err(reason) => {
                warn!("Rejected TC {}: {}", line, reason);
                TcResponse::Error(reason)
            }
        }
    }

    // ---- REGISTRATION ----

    fn field(&mut self, component: &'static str, name: &'static str, set: SetFn) {
        self.components
            .entry(component)
            .or_default()
            .insert(name, TcEntry::Field(set));
    }

    fn op(
        &mut self,
        component: &'static str,
        name: &'static str,
        params: &'static [&'static str],
        invoke: CallFn
    ) {
        self.components
            .entry(component)
            .or_default()
            .insert(name, TcEntry::Op { params, invoke });
    }

    fn register_state(&mut self) {
        const C: &str = "state";

        self.field(C, "x", |ds, v| {
            ds.state.x = as_f64(&v)?;
            Ok(())
        });
        self.field(C, "y", |ds, v| {
            ds.state.y = as_f64(&v)?;
            Ok(())
        });
        self.field(C, "yaw", |ds, v| {
            ds.state.set_yaw(as_f64(&v)?);
            Ok(())
        });
        self.field(C, "speed", |ds, v| {
            ds.state.speed = as_f64(&v)?;
            Ok(())
        });
        self.op(C, "update_compass", &["heading"], |ds, a| {
            ds.state.update_compass(as_f64(&a[0])?);
            Ok(())
        });
    }

    fn register_controls(&mut self) {
        const C: &str = "controls";

        self.field(C, "steer", |ds, v| {
            ds.controls.set_steer(as_f64(&v)?);
            Ok(())
        });
        self.field(C, "throttle", |ds, v| {
            ds.controls.set_throttle(as_f64(&v)?);
            Ok(())
        });
        self.field(C, "brake", |ds, v| {
            ds.controls.set_brake(as_f64(&v)?);
            Ok(())
        });
        self.op(C, "set_steer", &["steer"], |ds, a| {
            ds.controls.set_steer(as_f64(&a[0])?);
            Ok(())
        });
        self.op(C, "set_throttle", &["throttle"], |ds, a| {
            ds.controls.set_throttle(as_f64(&a[0])?);
            Ok(())
        });
        self.op(C, "set_brake", &["brake"], |ds, a| {
            ds.controls.set_brake(as_f64(&a[0])?);
            Ok(())
        });
    }

    fn register_speed_ctrl(&mut self) {
        const C: &str = "speed_control";

        self.field(C, "target_speed", |ds, v| {
            ds.speed_ctrl.target_speed = as_f64(&v)?;
            Ok(())
        });
        self.field(C, "enabled", |ds, v| {
            ds.speed_ctrl.enabled = as_bool(&v)?;
            Ok(())
        });
        self.field(C, "k_throttle", |ds, v| {
            ds.speed_ctrl.params.k_throttle = as_f64(&v)?;
            Ok(())
        });
        self.field(C, "k_brake", |ds, v| {
            ds.speed_ctrl.params.k_brake = as_f64(&v)?;
            Ok(())
        });
        self.op(C, "set_speed", &["speed"], |ds, a| {
            ds.speed_ctrl.set_speed(as_f64(&a[0])?);
            Ok(())
        });
        self.op(C, "enable", &[], |ds, _| {
            ds.speed_ctrl.enable();
            Ok(())
        });
        self.op(C, "disable", &[], |ds, _| {
            ds.speed_ctrl.disable();
            Ok(())
        });
    }

    fn register_head_ctrl(&mut self) {
        const C: &str = "heading_control";

        self.field(C, "target_heading", |ds, v| {
            ds.head_ctrl.target_heading = as_f64(&v)?;
            Ok(())
        });
        self.field(C, "enabled", |ds, v| {
            ds.head_ctrl.enabled = as_bool(&v)?;
            Ok(())
        });
        self.field(C, "k_p", |ds, v| {
            ds.head_ctrl.params.k_p = as_f64(&v)?;
            Ok(())
        });
        self.op(C, "set_heading", &["heading"], |ds, a| {
            ds.head_ctrl.set_heading(as_f64(&a[0])?);
            Ok(())
        });
        self.op(C, "set_steer", &["steering"], |ds, a| {
            let steer = as_f64(&a[0])?;
            ds.head_ctrl.set_steer(&mut ds.controls, steer);
            Ok(())
        });
        self.op(C, "enable", &[], |ds, _| {
            ds.head_ctrl.enable();
            Ok(())
        });
        self.op(C, "disable", &[], |ds, _| {
            ds.head_ctrl.disable();
            Ok(())
        });
    }

    fn register_coll_ctrl(&mut self) {
        const C: &str = "collision_control";

        self.field(C, "safe_distance", |ds, v| {
            ds.coll_ctrl
                .set_safe_distance(as_f64(&v)?)
                .map_err(|e| TcError::InvalidParams(e.to_string()))
        });
        self.field(C, "enabled", |ds, v| {
            ds.coll_ctrl.enabled = as_bool(&v)?;
            Ok(())
        });
        self.op(C, "set_safe_distance", &["distance"], |ds, a| {
            ds.coll_ctrl
                .set_safe_distance(as_f64(&a[0])?)
                .map_err(|e| TcError::CallFailed(e.to_string()))
        });
        self.op(C, "enable", &[], |ds, _| {
            ds.coll_ctrl.enable();
            Ok(())
        });
        self.op(C, "disable", &[], |ds, _| {
            ds.coll_ctrl.disable();
            Ok(())
        });
    }

    fn register_wp_ctrl(&mut self) {
        const C: &str = "waypoint_control";

        self.field(C, "arrival_radius", |ds, v| {
            ds.wp_ctrl
                .set_arrival_radius(as_f64(&v)?)
                .map_err(|e| TcError::InvalidParams(e.to_string()))
        });
        self.field(C, "enabled", |ds, v| {
            ds.wp_ctrl.enabled = as_bool(&v)?;
            Ok(())
        });
        self.op(C, "set_route", &["points"], |ds, a| {
            let points = serde_json::from_value::<Vec<[f64; 2]>>(a[0].clone())
                .map_err(|e| TcError::InvalidParams(
                    format!("expected a list of [x, y] points: {}", e)
                ))?;

            ds.wp_ctrl
                .set_route(points)
                .map_err(|e| TcError::CallFailed(e.to_string()))
        });
        self.op(C, "add_waypoint", &["x", "y"], |ds, a| {
            let (x, y) = (as_f64(&a[0])?, as_f64(&a[1])?);

            ds.wp_ctrl
                .add_waypoint(x, y)
                .map_err(|e| TcError::CallFailed(e.to_string()))
        });
        self.op(C, "clear_route", &[], |ds, _| {
            ds.wp_ctrl.clear_route();
            Ok(())
        });
        self.op(C, "enable", &[], |ds, _| {
            ds.wp_ctrl.enable();
            Ok(())
        });
        self.op(C, "disable", &[], |ds, _| {
            ds.wp_ctrl.disable();
            Ok(())
        });
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Normalise call arguments into a positional list matching the declared parameters.
fn positional_args(params: &[&str], args: Value) -> Result<Vec<Value>, TcError> {
    let args = match args {
        Value::Array(a) => a,
        Value::Object(mut map) => {
            let mut positional = Vec::with_capacity(params.len());

            for p in params {
                match map.remove(*p) {
                    Some(v) => positional.push(v),
                    None => return Err(TcError::InvalidParams(
                        format!("missing argument '{}'", p)
                    ))
                }
            }

            if let Some(k) = map.keys().next() {
                return Err(TcError::InvalidParams(format!("unexpected argument '{}'", k)))
            }

            positional
        },
        v => return Err(TcError::InvalidParams(v.to_string()))
    };

    if args.len() != params.len() {
        return Err(TcError::InvalidParams(format!(
            "expected {} argument(s), found {}",
            params.len(),
            args.len()
        )))
    }

    Ok(args)
}

fn as_f64(v: &Value) -> Result<f64, TcError> {
    v.as_f64()
        .ok_or_else(|| TcError::InvalidParams(format!("expected a number, found {}", v)))
}

fn as_bool(v: &Value) -> Result<bool, TcError> {
    v.as_bool()
        .ok_or_else(|| TcError::InvalidParams(format!("expected a boolean, found {}", v)))
}

#[cfg(test)]
mod test {
    use super::*;
    use util::module::Module;

    fn exec(reg: &TcRegistry, ds: &mut DataStore, line: &str) -> TcResponse {
        reg.exec_line(ds, line)
    }

    fn assert_error(resp: TcResponse, prefix: &str) {
        match resp {
            TcResponse::Error(reason) => assert!(
                reason.starts_with(prefix),
                "Expected an error starting with {:?}, got {:?}", prefix, reason
            ),
            TcResponse::Ok => panic!("Expected an error starting with {:?}, got OK", prefix)
        }
    }

    #[test]
    fn test_set_and_call() {
        let reg = TcRegistry::new();
        let mut ds = DataStore::default();

        assert!(exec(&reg, &mut ds, r#"["set","speed_control","target_speed",5.0]"#).is_ok());
        assert_eq!(ds.speed_ctrl.target_speed, 5.0);

        assert!(exec(&reg, &mut ds, r#"["call","heading_control","set_heading",[1.2]]"#).is_ok());
        assert_eq!(ds.head_ctrl.target_heading, 1.2);
        assert!(!ds.head_ctrl.enabled);

        assert!(exec(&reg, &mut ds, r#"["call","heading_control","enable",[]]"#).is_ok());
        assert!(ds.head_ctrl.enabled);

        assert!(exec(&reg, &mut ds, r#"["set","heading_control","enabled",false]"#).is_ok());
        assert!(!ds.head_ctrl.enabled);

        // Integers are accepted as numbers
        assert!(exec(&reg, &mut ds, r#"["set","controls","steer",3]"#).is_ok());
        assert_eq!(ds.controls.steer(), 1.0);
    }

    #[test]
    fn test_named_args() {
        let reg = TcRegistry::new();
        let mut ds = DataStore::default();

        let resp = exec(
            &reg, &mut ds,
            r#"["call","waypoint_control","add_waypoint",{"y": 2.0, "x": 1.0}]"#
        );
        assert!(resp.is_ok());
        assert_eq!(ds.wp_ctrl.status().num_waypoints, 1);

        assert_error(
            exec(&reg, &mut ds, r#"["call","waypoint_control","add_waypoint",{"x": 1.0}]"#),
            "Invalid message params: missing argument 'y'"
        );
        assert_error(
            exec(
                &reg, &mut ds,
                r#"["call","waypoint_control","add_waypoint",{"x": 1, "y": 2, "z": 3}]"#
            ),
            "Invalid message params: unexpected argument 'z'"
        );

        assert!(exec(
            &reg, &mut ds,
            r#"["call","waypoint_control","set_route",{"points": [[0, 1], [2, 3]]}]"#
        ).is_ok());
        assert_eq!(ds.wp_ctrl.status().num_waypoints, 2);

        assert!(exec(&reg, &mut ds, r#"["call","waypoint_control","clear_route",{}]"#).is_ok());
        assert_eq!(ds.wp_ctrl.status().num_waypoints, 0);
    }

    #[test]
    fn test_error_taxonomy() {
        let reg = TcRegistry::new();
        let mut ds = DataStore::default();

        assert_error(exec(&reg, &mut ds, "not json"), "Client message is not valid JSON");
        assert_error(exec(&reg, &mut ds, r#"["set","speed_control"]"#), "Invalid message");
        assert_error(
            exec(&reg, &mut ds, r#"["get","speed_control","target_speed",1]"#),
            "Unknown action: get"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["set","engine","rpm",1]"#),
            "Invalid message recipient: no component"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["set","speed_control","max_speed",1]"#),
            "Invalid message recipient: 'speed_control' has no"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["set","heading_control","set_heading",1.0]"#),
            "Invalid message attempted to set a callable object."
        );
        assert_error(
            exec(&reg, &mut ds, r#"["call","speed_control","target_speed",[1.0]]"#),
            "Invalid message attempted to call a non-callable object."
        );
        assert_error(
            exec(&reg, &mut ds, r#"["set","speed_control","target_speed","fast"]"#),
            "Invalid message params: expected a number"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["call","heading_control","set_heading",1.2]"#),
            "Invalid message params: 1.2"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["call","heading_control","set_heading",[1.2, 3]]"#),
            "Invalid message params: expected 1 argument(s), found 2"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["call","collision_control","set_safe_distance",[-1]]"#),
            "Call message caused an exception"
        );
        assert_error(
            exec(&reg, &mut ds, r#"["call","waypoint_control","set_route",[[1, 2]]]"#),
            "Invalid message params: expected a list of [x, y] points"
        );

        // Nothing was modified by the rejected commands
        assert_eq!(ds.speed_ctrl.target_speed, 0.0);
        assert_eq!(ds.head_ctrl.target_heading, 0.0);
        assert_eq!(ds.coll_ctrl.safe_distance(), 1.0);
    }
}
