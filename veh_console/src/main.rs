//! Interactive console issuing commands to the vehicle executable's command server.
//!
//! Commands take the form:
//!
//!     set <component> <name> <value>
//!     call <component> <name> [arg ...]
//!
//! Values and arguments are parsed as JSON where possible, and sent as strings otherwise.

use color_eyre::{eyre::WrapErr, Report};
use rustyline::{error::ReadlineError, DefaultEditor};
use serde_json::Value;
use std::{
    io::{BufRead, BufReader, Write},
    net::TcpStream
};
use structopt::StructOpt;

use comms_if::tc::{Tc, TcAction, TcResponse};

const PROMPT: &str = "veh $ ";

const HELP: &str = "\
Commands:
    set <component> <name> <value>     Set a field of a component
    call <component> <name> [arg ...]  Call an operation of a component
    help                               Show this message
    exit                               Leave the console";

#[derive(Debug, StructOpt)]
#[structopt(name = "veh_console", about = "Issues commands directly to the vehicle exec")]
struct Args {
    /// Address of the command server
    #[structopt(long, default_value = "127.0.0.1:60213")]
    addr: String,

    /// File the command history is kept in
    #[structopt(long, default_value = "data/history.txt")]
    history: String
}

#[derive(Debug, PartialEq)]
enum Command {
    Tc(Tc),
    Help,
    Exit
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum ParseError {
    #[error("Unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str)
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    let stream = TcpStream::connect(&args.addr)
        .wrap_err_with(|| format!("Could not connect to the command server at {}", args.addr))?;
    let mut reader = BufReader::new(
        stream.try_clone().wrap_err("Could not clone the command stream")?
    );
    let mut writer = stream;

    println!("Connected to {}", args.addr);

    let mut rl = DefaultEditor::new().wrap_err("Could not start the line editor")?;
    if rl.load_history(&args.history).is_err() {
        println!("No history detected");
    }

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled Error: {:?}", e);
                break
            }
        };

        if line.trim().is_empty() {
            continue
        }
        rl.add_history_entry(line.as_str()).ok();

        match parse(&line) {
            Ok(Command::Tc(tc)) => {
                writeln!(writer, "{}", tc.to_json())
                    .wrap_err("Could not send the command")?;

                let mut reply = String::new();
                if reader.read_line(&mut reply).wrap_err("Could not read the reply")? == 0 {
                    println!("Command server closed the connection");
                    break
                }

                match TcResponse::from_line(&reply) {
                    TcResponse::Ok => println!("OK"),
                    TcResponse::Error(e) => println!("ERROR: {}", e)
                }
            },
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Exit) => break,
            Err(e) => println!("{}", e)
        }
    }

    if let Err(e) = rl.save_history(&args.history) {
        println!("Could not save history: {}", e);
    }
    println!("Exiting...");

    Ok(())
}

fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();

    let cmd = match words.next() {
        Some(c) => c,
        None => return Err(ParseError::Usage("<command> [args ...]"))
    };

    match cmd {
        "help" => Ok(Command::Help),
        "exit" | "quit" => Ok(Command::Exit),
        "set" => {
            const USAGE: &str = "set <component> <name> <value>";

            let (component, name) = target(&mut words).ok_or(ParseError::Usage(USAGE))?;
            let rest: Vec<&str> = words.collect();
            if rest.is_empty() {
                return Err(ParseError::Usage(USAGE))
            }

            Ok(Command::Tc(Tc {
                action: TcAction::Set,
                component,
                name,
                params: to_value(&rest.join(" "))
            }))
        },
        "call" => {
            let (component, name) = target(&mut words)
                .ok_or(ParseError::Usage("call <component> <name> [arg ...]"))?;

            Ok(Command::Tc(Tc {
                action: TcAction::Call,
                component,
                name,
                params: Value::Array(words.map(to_value).collect())
            }))
        },
        c => Err(ParseError::UnknownCommand(c.to_string()))
    }
}

fn target<'a, I>(words: &mut I) -> Option<(String, String)>
where
    I: Iterator<Item = &'a str>
{
    Some((words.next()?.to_string(), words.next()?.to_string()))
}

fn to_value(word: &str) -> Value {
    serde_json::from_str(word).unwrap_or_else(|_| Value::String(word.to_string()))
}
