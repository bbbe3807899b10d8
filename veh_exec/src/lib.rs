//! # Vehicle library.
//!
//! This library allows other crates in the workspace, and the integration tests, to access items
//! defined inside the vehicle executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Vehicle state - fuses odometry with absolute position and heading fixes
pub mod state;

/// Vehicle controls - the clamped steer, throttle and brake demands
pub mod controls;

/// Speed control - converts a target speed into throttle and brake demands
pub mod speed_ctrl;

/// Heading control - converts a target heading into a steer demand
pub mod head_ctrl;

/// Collision control - monitors ranging sweeps and overrides motion when blocked
pub mod coll_ctrl;

/// Waypoint control - follows a route of straight-line legs
pub mod wp_ctrl;

/// Global data store, owns every component and sequences their processing
pub mod data_store;

/// Telecommand processor - the command registry
pub mod tc_processor;

/// Telemetry server - broadcasts status packets to subscribers
pub mod tm_server;

/// Simulation client - negotiates and handles the simulator's streams
pub mod sim_client;

/// Network parameters of the executable
pub mod params;

/// The executive, wiring every link of the reactor to the data store
pub mod exec;
