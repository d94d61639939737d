//! `converge run` command.

use std::path::Path;

use crate::config::RunnerConfig;
use crate::context::ServiceContext;
use crate::plan::runner::Mode;

/// Execute the `run` command: probe, remediate, re-verify.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or the report
/// cannot be rendered.
pub fn run(
    ctx: &ServiceContext,
    config: &RunnerConfig,
    plan_path: Option<&Path>,
    only_phase: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    super::execute(ctx, config, Mode::Converge, plan_path, only_phase, json)
}
