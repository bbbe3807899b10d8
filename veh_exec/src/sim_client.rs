//! # Simulation Client
//!
//! The SimClient negotiates the simulator's streams over the service link and tracks the
//! resulting stream links. Once the service link is up the port of each configured stream is
//! requested, and every successful reply opens the matching stream link.
//!
//! Stream messages themselves are processed by the executive, the client only keeps hold of the
//! motion link so demands can be sent on it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use std::{collections::HashMap, time::Duration};

use comms_if::{
    net::{ConnId, Reactor, ReactorError},
    sim::{MotionDems, ServiceReply, ServiceRequest, StreamKind}
};

use crate::{exec::Link, params::NetParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SimClient {
    sim_host: String,
    requests: Vec<ServiceRequest>,
    stream_reconnect: Option<Duration>,

    /// Open stream links
    streams: HashMap<StreamKind, ConnId>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Cannot send a motion message without a connection to the motion stream")]
    NotConnected,

    #[error("Could not serialize the data: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not send the motion message: {0}")]
    SendFailed(ReactorError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    /// Create the client and queue the dial of the service link.
    pub fn new(reactor: &mut Reactor<Link>, params: &NetParams) -> Self {
        reactor.connect(&params.service_addr(), Link::Service, None);

        let requests = params.streams
            .iter()
            .map(|s| ServiceRequest::get_stream_port(&s.kind.port_request_id(), &s.component))
            .collect();

        Self {
            sim_host: params.sim_host.clone(),
            requests,
            stream_reconnect: params.stream_reconnect(),
            streams: HashMap::new()
        }
    }

    /// Request the ports of the configured streams.
    pub fn on_service_connect(&mut self, reactor: &mut Reactor<Link>, conn: ConnId) {
        info!("Connected to the simulator service");

        for req in self.requests.iter() {
            debug!("Service request: {}", req.to_line());

            if let Err(e) = reactor.send_line(conn, &req.to_line()) {
                warn!("Could not send service request {}: {}", req.id, e);
            }
        }
    }

    /// Handle a service reply, opening the stream link it gives the port of.
    pub fn on_service_line(&mut self, reactor: &mut Reactor<Link>, line: &str) {
        let reply = match ServiceReply::from_line(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("{}", e);
                return
            }
        };

        if !reply.success {
            warn!("Service command failed: {}", line);
            return
        }

        let kind = match StreamKind::from_port_request_id(&reply.id) {
            Some(k) => k,
            None => {
                warn!("Unhandled service reply identifier: {}", reply.id);
                return
            }
        };

        match reply.port() {
            Ok(port) => {
                let addr = format!("{}:{}", self.sim_host, port);
                info!("Opening {} stream on {}", kind, addr);
                reactor.connect(&addr, Link::Stream(kind), self.stream_reconnect);
            },
            Err(e) => warn!("Could not open {} stream: {}", kind, e)
        }
    }

    pub fn on_stream_connect(&mut self, kind: StreamKind, conn: ConnId) {
        info!("Connected to the {} stream", kind);
        self.streams.insert(kind, conn);
    }

    pub fn on_stream_close(&mut self, kind: StreamKind, conn: ConnId) {
        info!("Disconnected from the {} stream", kind);

        // A redialled link may already have replaced this one
        if self.streams.get(&kind) == Some(&conn) {
            self.streams.remove(&kind);
        }
    }

    /// Send demands on the motion stream.
    pub fn send_motion(
        &self,
        reactor: &mut Reactor<Link>,
        dems: &MotionDems
    ) -> Result<(), SimClientError> {
        let conn = self.streams
            .get(&StreamKind::Motion)
            .ok_or(SimClientError::NotConnected)?;

        let line = serde_json::to_string(dems).map_err(SimClientError::SerializationError)?;
        debug!("Sending motion message: {}", line);

        reactor.send_line(*conn, &line).map_err(SimClientError::SendFailed)
    }
}
