//! `converge wait` command: deploy-time "wait for services".

use std::path::Path;
use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::context::ServiceContext;
use crate::endpoint::{self, EndpointStatus};

/// Execute the `wait` command: poll the plan's declared endpoints until
/// every one is healthy or timed out. Exits nonzero only when a required
/// endpoint timed out.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded or the async
/// runtime cannot be built.
pub fn run(
    ctx: &ServiceContext,
    config: &RunnerConfig,
    plan_path: Option<&Path>,
) -> Result<u8, String> {
    let (plan, _probes, _actions) = super::load_plan(ctx, plan_path)?;
    let Some(phase) = plan.endpoints else {
        println!("plan declares no endpoints; nothing to wait for");
        return Ok(0);
    };

    println!("waiting for {} endpoint(s)...", phase.endpoints.len());
    let results = endpoint::wait_for_all_blocking(
        Arc::clone(&ctx.net),
        phase.endpoints,
        super::poll_policy(config),
    )?;

    let mut fatal = false;
    for result in &results {
        match result.status {
            EndpointStatus::Healthy { attempts } => {
                println!("  [HEALTHY] {} ({attempts} attempt(s))", result.name);
            }
            EndpointStatus::TimedOut { attempts } => {
                let severity = if result.required { "required" } else { "optional" };
                println!(
                    "  [TIMEOUT] {} ({severity}, gave up after {attempts} attempt(s))",
                    result.name
                );
                fatal |= result.is_fatal();
            }
        }
    }
    Ok(u8::from(fatal))
}
