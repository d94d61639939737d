//! Command dispatch and handlers.

pub mod run;
pub mod status;
pub mod verify;
pub mod wait;

use std::path::Path;
use std::sync::Arc;

use crate::cli::Command;
use crate::config::RunnerConfig;
use crate::context::ServiceContext;
use crate::endpoint::{self, EndpointResult, EndpointStatus, PollPolicy};
use crate::plan::runner::{Mode, PlanRunner};
use crate::plan::{registry, ActionSet, Plan, PlanDocument, ProbeSet};
use crate::report::{self, CheckResult, CheckStatus, VerificationReport};

/// Dispatch a parsed command to its handler.
///
/// Configuration is assembled once here (defaults, `.env`, `CONVERGE_*`
/// overrides) and passed down by reference.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails before
/// it can produce a report.
pub fn dispatch(command: &Command) -> Result<u8, String> {
    dotenvy::dotenv().ok();
    let config = RunnerConfig::from_env();
    let ctx = ServiceContext::live(&config);
    dispatch_with_context(command, &ctx, &config)
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &RunnerConfig,
) -> Result<u8, String> {
    match command {
        Command::Run { phase, plan, json } => {
            run::run(ctx, config, plan.as_deref(), phase.as_deref(), *json)
        }
        Command::Verify { plan, json } => verify::run(ctx, config, plan.as_deref(), *json),
        Command::Wait { plan } => wait::run(ctx, config, plan.as_deref()),
        Command::Status { plan } => status::run(ctx, plan.as_deref()),
    }
}

/// Loads and validates the plan: the built-in registry, or a YAML plan
/// file when one was supplied.
pub(crate) fn load_plan(
    ctx: &ServiceContext,
    path: Option<&Path>,
) -> Result<(Plan, ProbeSet, ActionSet), String> {
    let document = match path {
        Some(path) => {
            let text = ctx.fs.read_to_string(path).map_err(|e| e.to_string())?;
            PlanDocument::from_yaml(&text)?
        }
        None => registry::builtin(),
    };
    document.into_parts()
}

pub(crate) fn poll_policy(config: &RunnerConfig) -> PollPolicy {
    PollPolicy {
        interval: config.poll_interval,
        attempt_timeout: config.attempt_timeout,
        max_attempts: config.max_attempts,
    }
}

/// Shared driver for `run` and `verify`: probe phases, then the endpoint
/// phase, then one finalized report.
pub(crate) fn execute(
    ctx: &ServiceContext,
    config: &RunnerConfig,
    mode: Mode,
    plan_path: Option<&Path>,
    only_phase: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let (plan, probes, actions) = load_plan(ctx, plan_path)?;
    let mut report = VerificationReport::new(ctx.id_gen.generate_id(), ctx.clock.now());

    let runner = PlanRunner::new(ctx, config, &probes, &actions);
    let blocked = runner.run(&plan, mode, only_phase, &mut report);
    run_endpoint_phase(ctx, config, &plan, &blocked, only_phase, &mut report)?;

    let summary = report.finalize();
    let rendered = if json {
        report::render_json(&report, &summary)?
    } else {
        report::render_text(&report, &summary)
    };
    println!("{rendered}");
    Ok(u8::try_from(summary.exit_code).unwrap_or(1))
}

fn run_endpoint_phase(
    ctx: &ServiceContext,
    config: &RunnerConfig,
    plan: &Plan,
    blocked: &std::collections::HashSet<String>,
    only_phase: Option<&str>,
    report: &mut VerificationReport,
) -> Result<(), String> {
    let Some(phase) = &plan.endpoints else {
        return Ok(());
    };
    if let Some(only) = only_phase {
        if only != phase.name {
            return Ok(());
        }
    }
    if only_phase.is_none() && phase.depends_on.iter().any(|dep| blocked.contains(dep)) {
        for spec in &phase.endpoints {
            report.record(CheckResult {
                probe_id: spec.name.clone(),
                phase: phase.name.clone(),
                initial_status: CheckStatus::Skipped,
                action_taken: false,
                final_status: CheckStatus::Skipped,
                message: "skipped: a dependency phase failed earlier in this run".into(),
                duration_ms: 0,
            });
        }
        return Ok(());
    }

    let started = ctx.clock.now();
    let results = endpoint::wait_for_all_blocking(
        Arc::clone(&ctx.net),
        phase.endpoints.clone(),
        poll_policy(config),
    )?;
    let elapsed_ms = (ctx.clock.now() - started).num_milliseconds();
    record_endpoint_results(report, &phase.name, &results, elapsed_ms);
    Ok(())
}

/// Folds endpoint results into the report: healthy endpoints pass,
/// required timeouts fail, optional timeouts only warn.
pub(crate) fn record_endpoint_results(
    report: &mut VerificationReport,
    phase: &str,
    results: &[EndpointResult],
    elapsed_ms: i64,
) {
    for result in results {
        match result.status {
            EndpointStatus::Healthy { attempts } => report.record(CheckResult {
                probe_id: result.name.clone(),
                phase: phase.to_string(),
                initial_status: CheckStatus::Passed,
                action_taken: false,
                final_status: CheckStatus::Passed,
                message: format!("healthy after {attempts} attempt(s)"),
                duration_ms: elapsed_ms,
            }),
            EndpointStatus::TimedOut { attempts } if result.required => {
                report.record(CheckResult {
                    probe_id: result.name.clone(),
                    phase: phase.to_string(),
                    initial_status: CheckStatus::Failed,
                    action_taken: false,
                    final_status: CheckStatus::Failed,
                    message: format!("required endpoint timed out after {attempts} attempt(s)"),
                    duration_ms: elapsed_ms,
                });
            }
            EndpointStatus::TimedOut { attempts } => report.warn(format!(
                "optional endpoint {} timed out after {attempts} attempt(s)",
                result.name
            )),
        }
    }
}
