//! replica-router CLI entry point
//!
//! Parses arguments and dispatches to the CLI module. Errors are printed to
//! stderr and end the process with a non-zero exit code.

use replica_router::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
