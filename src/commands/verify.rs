//! `converge verify` command.

use std::path::Path;

use crate::config::RunnerConfig;
use crate::context::ServiceContext;
use crate::plan::runner::Mode;

/// Execute the `verify` command: probe host state and endpoints without
/// remediating anything.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or the report
/// cannot be rendered.
pub fn run(
    ctx: &ServiceContext,
    config: &RunnerConfig,
    plan_path: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    super::execute(ctx, config, Mode::VerifyOnly, plan_path, None, json)
}
