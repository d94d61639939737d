//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `converge`.
#[derive(Debug, Parser)]
#[command(name = "converge", version, about = "Apply and verify declared host state")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Probe host state, remediate failures, and re-verify convergence.
    Run {
        /// Run only the named phase.
        #[arg(long)]
        phase: Option<String>,
        /// YAML plan file replacing the built-in plan.
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Emit the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Probe host state and endpoints without remediating anything.
    Verify {
        /// YAML plan file replacing the built-in plan.
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Emit the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Wait for the plan's declared endpoints to become healthy.
    Wait {
        /// YAML plan file replacing the built-in plan.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
    /// Show the plan's phases, probes, and current container state.
    Status {
        /// YAML plan file replacing the built-in plan.
        #[arg(long)]
        plan: Option<PathBuf>,
    },
}
