//! Module interfaces
//!
//! Each vehicle component in `veh_exec` (state, controls and the controllers)
//! shall implement the `Module` trait in this module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use serde::{de::DeserializeOwned, Serialize};

// Internal imports
use crate::params::{self, LoadError};

// ---------------------------------------------------------------------------
// MODULE TRAIT
// ---------------------------------------------------------------------------

/// A vehicle component which is built from parameters and can report its
/// status.
pub trait Module: Sized {
    /// The parameters the module is built from.
    type Params: DeserializeOwned;

    /// A snapshot of the module's status, serialized into telemetry.
    type StatusReport: Serialize;

    /// Build the module from its parameters.
    fn new(params: Self::Params) -> Self;

    /// Initialise the module from the given parameter file.
    ///
    /// # Inputs
    /// - `param_file_path`: path of the file relative to the params directory.
    ///
    /// # Outputs
    /// - On success the initialised module.
    /// - On error the `LoadError` raised while reading the parameters.
    fn init(param_file_path: &str) -> Result<Self, LoadError> {
        params::load(param_file_path).map(Self::new)
    }

    /// Get the module's current status report.
    fn status(&self) -> Self::StatusReport;
}
