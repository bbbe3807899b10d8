//! # Executive
//!
//! The executive owns the data store and handles every link of the reactor:
//!
//! - the simulator service link, whose loss is fatal,
//! - the simulator stream links, driving the data store's processing,
//! - the status server's subscribers,
//! - the command server's clients.
//!
//! All processing happens inside the reactor's callbacks on a single thread, so the data store is
//! never shared.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use serde::de::DeserializeOwned;
use std::{io, net::SocketAddr};

use comms_if::{
    net::{ConnError, ConnId, LinkHandler, Reactor, ReactorError},
    sim::{CompassMsg, GpsMsg, OdometryMsg, PoseMsg, RangeMsg, StreamKind}
};

use crate::{
    data_store::DataStore,
    params::NetParams,
    sim_client::SimClient,
    tc_processor::TcRegistry,
    tm_server::TmServer
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Exec {
    pub ds: DataStore,
    registry: TcRegistry,
    sim_client: SimClient,
    tm_server: TmServer,
    command_addr: SocketAddr,

    /// Set when the executive stopped the reactor because of a fatal error
    exit_cause: Option<ExecError>
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The role of a link in the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Outbound link to the simulator's service
    Service,

    /// Outbound link to one of the simulator's streams
    Stream(StreamKind),

    /// Subscriber accepted by the status server
    StatusClient,

    /// Client accepted by the command server
    CommandClient
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Could not start the {0} server: {1}")]
    ServerInitError(&'static str, ReactorError),

    #[error("Could not connect to the simulator service at {0}: {1}")]
    ServiceConnectFailed(String, io::Error),

    #[error("Lost the connection to the simulator service: {0}")]
    ServiceLinkLost(String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Exec {
    /// Open the status and command servers and queue the dial of the simulator service.
    pub fn new(
        reactor: &mut Reactor<Link>,
        ds: DataStore,
        params: &NetParams
    ) -> Result<Self, ExecError> {
        let tm_server = TmServer::new(reactor, &params.status_server_addr)
            .map_err(|e| ExecError::ServerInitError("status", e))?;
        info!("Status server listening on {}", tm_server.addr());

        let command_addr = reactor.listen(params.command_server_addr.as_str(), Link::CommandClient)
            .map_err(|e| ExecError::ServerInitError("command", e))?;
        info!("Command server listening on {}", command_addr);

        let sim_client = SimClient::new(reactor, params);

        Ok(Self {
            ds,
            registry: TcRegistry::new(),
            sim_client,
            tm_server,
            command_addr,
            exit_cause: None
        })
    }

    /// Address of the status server.
    pub fn status_addr(&self) -> SocketAddr {
        self.tm_server.addr()
    }

    /// Address of the command server.
    pub fn command_addr(&self) -> SocketAddr {
        self.command_addr
    }

    /// Run the reactor until it is stopped.
    ///
    /// Returns an error if it was stopped by the loss of the simulator service.
    pub fn run(&mut self, reactor: &mut Reactor<Link>) -> Result<(), ExecError> {
        reactor.run(self);

        match self.exit_cause.take() {
            Some(e) => Err(e),
            None => Ok(())
        }
    }

    fn fatal(&mut self, reactor: &mut Reactor<Link>, cause: ExecError) {
        error!("{}", cause);
        self.exit_cause = Some(cause);
        reactor.stop();
    }

    fn proc_stream_line(&mut self, reactor: &mut Reactor<Link>, kind: StreamKind, line: &str) {
        match kind {
            StreamKind::Motion => warn!("Got unhandled motion message: {}", line),
            StreamKind::Odometry => {
                if let Some(msg) = parse_stream::<OdometryMsg>(kind, line) {
                    let dems = self.ds.proc_odometry(&msg);

                    if let Err(e) = self.sim_client.send_motion(reactor, &dems) {
                        warn!("{}", e);
                    }
                    if let Err(e) = self.tm_server.send(reactor, &self.ds) {
                        warn!("TmServer error: {}", e);
                    }
                }
            },
            StreamKind::Range => {
                if let Some(msg) = parse_stream::<RangeMsg>(kind, line) {
                    self.ds.proc_range(msg);
                }
            },
            StreamKind::Gps => {
                if let Some(msg) = parse_stream::<GpsMsg>(kind, line) {
                    self.ds.proc_gps(&msg);
                }
            },
            StreamKind::Compass => {
                if let Some(msg) = parse_stream::<CompassMsg>(kind, line) {
                    self.ds.proc_compass(&msg);
                }
            },
            StreamKind::Pose => {
                if let Some(msg) = parse_stream::<PoseMsg>(kind, line) {
                    self.ds.proc_pose(&msg);
                }
            }
        }
    }
}

impl LinkHandler<Link> for Exec {
    fn on_connect(&mut self, reactor: &mut Reactor<Link>, conn: ConnId, tag: Link) {
        match tag {
            Link::Service => self.sim_client.on_service_connect(reactor, conn),
            Link::Stream(kind) => self.sim_client.on_stream_connect(kind, conn),
            Link::StatusClient => info!("Status client {} connected", conn),
            Link::CommandClient => info!("Command client {} connected", conn)
        }
    }

    fn on_line(&mut self, reactor: &mut Reactor<Link>, conn: ConnId, tag: Link, line: &str) {
        match tag {
            Link::Service => self.sim_client.on_service_line(reactor, line),
            Link::Stream(kind) => self.proc_stream_line(reactor, kind, line),
            Link::StatusClient => {
                warn!("Status client sent a message, but no messages are supported")
            },
            Link::CommandClient => {
                let response = self.registry.exec_line(&mut self.ds, line);

                if let Err(e) = reactor.send_line(conn, &response.to_string()) {
                    warn!("Could not respond to TC: {}", e);
                }
            }
        }
    }

    fn on_close(&mut self, reactor: &mut Reactor<Link>, conn: ConnId, tag: Link, reason: &ConnError) {
        match tag {
            Link::Service => self.fatal(reactor, ExecError::ServiceLinkLost(reason.to_string())),
            Link::Stream(kind) => self.sim_client.on_stream_close(kind, conn),
            Link::StatusClient => info!("Status client {} disconnected", conn),
            Link::CommandClient => info!("Command client {} disconnected", conn)
        }
    }

    fn on_dial_failed(&mut self, reactor: &mut Reactor<Link>, tag: Link, addr: &str, err: &io::Error) {
        match tag {
            Link::Service => {
                let cause = ExecError::ServiceConnectFailed(
                    addr.to_string(),
                    io::Error::new(err.kind(), err.to_string())
                );
                self.fatal(reactor, cause)
            },
            Link::Stream(kind) => warn!("Could not open the {} stream at {}: {}", kind, addr, err),
            _ => ()
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a stream message, logging and dropping it if invalid.
fn parse_stream<T>(kind: StreamKind, line: &str) -> Option<T>
where
    T: DeserializeOwned
{
    match serde_json::from_str(line) {
        Ok(msg) => Some(msg),
        Err(e) => {
            warn!("Invalid {} message: {}", kind, e);
            None
        }
    }
}
