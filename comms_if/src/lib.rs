//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand protocol spoken by the command server
pub mod tc;

/// Simulator service and stream messages
pub mod sim;

/// Network module
pub mod net;
