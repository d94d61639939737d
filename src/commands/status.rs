//! `converge status` command.

use std::path::Path;

use crate::context::ServiceContext;

/// Execute the `status` command.
///
/// Displays a table of the plan's probes showing phase, probe id,
/// mapped remediation, and description, followed by the orchestrator's
/// current container listing.
///
/// # Errors
///
/// Returns an error string if the plan cannot be loaded.
pub fn run(ctx: &ServiceContext, plan_path: Option<&Path>) -> Result<u8, String> {
    let (plan, probes, actions) = super::load_plan(ctx, plan_path)?;

    // Collect rows for column-width calculation.
    let mut rows: Vec<(String, String, String, String)> = Vec::new();
    for phase in &plan.phases {
        for probe_id in &phase.probes {
            let Some(probe) = probes.get(probe_id) else { continue };
            let remediation = actions.for_probe(probe_id).map_or_else(
                || "-".to_string(),
                |action| {
                    let mut label = action.id.clone();
                    if action.needs_root {
                        label.push_str(" (root)");
                    }
                    if action.requires_restart {
                        label.push_str(" (restart)");
                    }
                    label
                },
            );
            let phase_label = if phase.critical {
                format!("{}!", phase.name)
            } else {
                phase.name.clone()
            };
            rows.push((phase_label, probe.id.clone(), remediation, probe.description.clone()));
        }
    }

    if rows.is_empty() {
        println!("plan declares no probes.");
    } else {
        let phase_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(5).max(5);
        let probe_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(5).max(5);
        let action_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(11).max(11);

        println!(
            "{:<phase_width$}  {:<probe_width$}  {:<action_width$}  DESCRIPTION",
            "PHASE", "PROBE", "REMEDIATION",
        );
        println!(
            "{:-<phase_width$}  {:-<probe_width$}  {:-<action_width$}  -----------",
            "", "", "",
        );
        for (phase, probe, action, description) in &rows {
            println!(
                "{phase:<phase_width$}  {probe:<probe_width$}  {action:<action_width$}  {description}",
            );
        }
        println!("\n{} probe(s); phases marked ! are critical.", rows.len());
    }

    if let Some(endpoints) = &plan.endpoints {
        println!("\nendpoints:");
        for spec in &endpoints.endpoints {
            let severity = if spec.required { "required" } else { "optional" };
            println!("  {} ({severity}) -> {}", spec.name, spec.target.key());
        }
    }

    println!();
    match ctx.containers.ps() {
        Ok(containers) if containers.is_empty() => println!("no containers running."),
        Ok(containers) => {
            println!("containers:");
            for info in containers {
                println!("  {}  {}  {}", info.name, info.status, info.ports);
            }
        }
        Err(e) => println!("container listing unavailable: {e}"),
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake;
    use crate::ports::containers::ContainerStatus;

    #[test]
    fn status_over_builtin_plan_succeeds() {
        let (ctx, handles) = fake::context();
        handles
            .containers
            .lock()
            .unwrap()
            .statuses
            .insert("app".into(), ContainerStatus::Up);

        let code = run(&ctx, None).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn status_reports_empty_plan() {
        let (ctx, handles) = fake::context();
        let path = std::path::PathBuf::from("/plans/empty.yaml");
        handles
            .fs
            .lock()
            .unwrap()
            .files
            .insert(path.clone(), "phases: []\nprobes: []\n".to_string());

        let code = run(&ctx, Some(&path)).unwrap();
        assert_eq!(code, 0);
    }
}
