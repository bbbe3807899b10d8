//! Main vehicle executable entry point.
//!
//! # Architecture
//!
//! The executable is driven entirely by the messages it receives:
//!
//!     - Initialise all modules from their parameter files
//!     - Open the status and command servers
//!     - Connect to the simulator service and request the stream ports
//!     - Reactor loop:
//!         - Range messages update the collision controller
//!         - GPS and pose messages update the state and the waypoint controller
//!         - Compass messages update the state and the heading controller
//!         - Odometry messages advance time, run the speed controller, send the motion demands
//!           and broadcast the status
//!         - Command lines are executed against the data store and answered
//!
//! The executable exits when interrupted, or with an error if the simulator service is lost.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use structopt::StructOpt;

// Internal
use comms_if::net::Reactor;
use util::{
    logger::{logger_init, LevelFilter},
    session::Session
};
use veh_lib::{data_store::DataStore, exec::Exec, params::NetParams};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "veh_exec", about = "Vehicle control executable")]
struct Args {
    /// Minimum level of the logs, at least "info"
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "veh_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(args.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Vehicle Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load(
        "net.toml"
    ).wrap_err("Could not load net params")?;

    let ds = DataStore::init().wrap_err("Failed to initialise the data store")?;

    info!("Exec parameters loaded");

    // ---- SIGNAL HANDLING ----

    let run_flag = Arc::new(AtomicBool::new(true));
    {
        let run_flag = run_flag.clone();
        ctrlc::set_handler(move || {
            run_flag.store(false, Ordering::SeqCst);
        }).wrap_err("Failed to set the interrupt handler")?;
    }

    // ---- INITIALISE NETWORK ----

    let mut reactor = Reactor::new(net_params.reactor.clone());
    reactor.set_run_flag(run_flag);

    let mut exec = Exec::new(&mut reactor, ds, &net_params)
        .wrap_err("Failed to initialise the executive")?;

    info!("Initialisation complete, entering main loop\n");

    // ---- MAIN LOOP ----

    exec.run(&mut reactor).wrap_err("Executive stopped")?;

    info!("End of execution after {} odometry ticks", exec.ds.num_ticks);

    Ok(())
}
