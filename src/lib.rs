//! Core library entry for the `converge` CLI.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod plan;
pub mod ports;
pub mod report;

use clap::Parser;

/// Run the CLI with the provided arguments, returning the process exit
/// code (`0` iff no check failed).
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command
/// execution fails before a report can be produced.
pub fn run<I, T>(args: I) -> Result<u8, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
