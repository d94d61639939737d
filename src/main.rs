//! Binary entrypoint for the `converge` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    match converge::run(std::env::args()) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
