//! Logging setup for the vehicle executables
//!
//! Records go to the terminal with coloured level tags, and to the session's log file with plain
//! tags so the file stays readable outside a terminal.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::Colorize;
use log::{self, info, Level, Record};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must be at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger of this execution.
///
/// `min_level` must be `Info` or more verbose. Debug and trace records carry their target module.
///
/// Must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Line::new(record, message, true)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", Line::new(record, message, false)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Vehicle logging started at {:?}", min_level);
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log file: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE
// ---------------------------------------------------------------------------

/// One formatted log line.
struct Line<'a> {
    elapsed_s: f64,
    level: Level,
    target: Option<&'a str>,
    message: &'a fmt::Arguments<'a>,
    colour: bool
}

impl<'a> Line<'a> {
    fn new(record: &'a Record, message: &'a fmt::Arguments<'a>, colour: bool) -> Self {
        Self {
            elapsed_s: session::get_elapsed_seconds(),
            level: record.level(),
            target: Some(record.target()).filter(|_| record.level() > Level::Info),
            message,
            colour
        }
    }
}

impl<'a> fmt::Display for Line<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = level_tag(self.level);

        if self.colour {
            write!(f, "[{:10.6} {}] ", self.elapsed_s, colour_tag(self.level, tag))?;
        }
        else {
            write!(f, "[{:10.6} {}] ", self.elapsed_s, tag)?;
        }

        match self.target {
            Some(t) => write!(f, "{}: {}", t, self.message),
            None => write!(f, "{}", self.message)
        }
    }
}

/// Three letter tag of a level.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR"
    }
}

fn colour_tag(level: Level, tag: &str) -> colored::ColoredString {
    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info  => tag.normal(),
        Level::Warn  => tag.yellow(),
        Level::Error => tag.red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn plain(level: Level, target: &str, message: fmt::Arguments) -> String {
        let record = Record::builder().level(level).target(target).build();
        let line = Line::new(&record, &message, false);

        // Elapsed time differs between runs, only keep the tag and what follows it
        let text = line.to_string();
        let close = text.find("] ").unwrap();
        text[close - 3..].to_string()
    }

    #[test]
    fn test_plain_lines() {
        assert_eq!(
            plain(Level::Info, "veh_lib::exec", format_args!("Connected")),
            "INF] Connected"
        );
        assert_eq!(
            plain(Level::Debug, "comms_if::net", format_args!("Closing {}", 3)),
            "DBG] comms_if::net: Closing 3"
        );
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Warn), "WRN");
        assert_eq!(level_tag(Level::Trace), "TRC");
    }
}
