//! Run a command as a member of a network restriction group, without the privileges
//! needed to join it.
//!
//! This binary is meant to be installed setuid root.

use std::ffi::OsString;
use std::process::ExitCode;

use no_networking::cli::{self, Invocation, UsageError};
use no_networking::{confine, launch, logging, Host};

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();
    let program = cli::program_name(&args);

    let (mode, command) = match cli::parse(&args) {
        Ok(Invocation::Help) => {
            print!("{}", cli::usage(&program));
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Run { mode, command }) => (mode, command),
        Err(UsageError::Clap(err)) => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("{program}: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::configure();

    let confined = match confine(&mut Host, mode) {
        Ok(confined) => confined,
        Err(err) => {
            eprintln!("{program}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let err = launch::exec(&confined, &command);
    eprintln!("{program}: {err}");
    ExitCode::from(err.exit_code())
}
