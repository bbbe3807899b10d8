//! # Network Module
//!
//! This module provides a single-threaded reactor over plain TCP sockets, carrying
//! newline-delimited text messages.
//!
//! The reactor owns any number of listening sockets and connected links, each labelled with a
//! caller-chosen tag. Every loop iteration it accepts pending clients, dials queued outbound
//! links, reads whatever is available on each link, flushes pending output, and dispatches the
//! resulting events to a [`LinkHandler`]. Handlers are given the reactor back so they can send,
//! broadcast, close links or stop the loop from within a callback.
//!
//! Nothing in the loop blocks: outbound connects are started non-blocking and polled, and a link
//! whose peer stops reading is closed once its pending output passes `max_send_buf`.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod conn;
mod reactor;

pub use conn::{ConnError, ConnId};
pub use reactor::{LinkHandler, Reactor, ReactorError, ReactorParams};
