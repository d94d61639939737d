//! Plan runner: sequences probes and actions through named phases.
//!
//! Execution is strictly sequential within and across phases; host
//! package managers and systemd serialize poorly under concurrency.
//! Every failure mode folds into a `CheckResult` at the phase boundary,
//! so one bad check never aborts the run.

use std::collections::HashSet;

use crate::config::RunnerConfig;
use crate::context::ServiceContext;
use crate::error::RunError;
use crate::plan::action::{ActionOutcome, ActionSet};
use crate::plan::probe::{ProbeOutcome, ProbeSet};
use crate::plan::{Phase, Plan};
use crate::report::{CheckResult, CheckStatus, VerificationReport};

/// Whether failing probes may be remediated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Probe, remediate on failure, then re-probe to confirm convergence.
    Converge,
    /// Probe only; never apply actions.
    VerifyOnly,
}

/// Executes a plan's probe phases against a service context.
pub struct PlanRunner<'a> {
    ctx: &'a ServiceContext,
    config: &'a RunnerConfig,
    probes: &'a ProbeSet,
    actions: &'a ActionSet,
}

impl<'a> PlanRunner<'a> {
    /// Creates a runner over the given context and registries.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        config: &'a RunnerConfig,
        probes: &'a ProbeSet,
        actions: &'a ActionSet,
    ) -> Self {
        Self { ctx, config, probes, actions }
    }

    /// Runs the plan's phases in declared order, recording one
    /// `CheckResult` per probe into `report`.
    ///
    /// Returns the set of blocked phase names: failed critical phases
    /// plus phases skipped because of them. The caller uses it to decide
    /// whether the endpoint phase may run.
    pub fn run(
        &self,
        plan: &Plan,
        mode: Mode,
        only_phase: Option<&str>,
        report: &mut VerificationReport,
    ) -> HashSet<String> {
        let mut blocked: HashSet<String> = HashSet::new();
        for phase in &plan.phases {
            if let Some(only) = only_phase {
                if phase.name != only {
                    continue;
                }
            }
            // A single-phase run has no prior phases to depend on.
            if only_phase.is_none() && phase.depends_on.iter().any(|dep| blocked.contains(dep)) {
                self.skip_phase(phase, &blocked, report);
                blocked.insert(phase.name.clone());
                continue;
            }
            let phase_failed = self.run_phase(phase, mode, report);
            if phase.critical && phase_failed {
                blocked.insert(phase.name.clone());
            }
        }
        blocked
    }

    fn skip_phase(&self, phase: &Phase, blocked: &HashSet<String>, report: &mut VerificationReport) {
        let culprit = phase
            .depends_on
            .iter()
            .find(|dep| blocked.contains(*dep))
            .map_or_else(String::new, Clone::clone);
        for probe_id in &phase.probes {
            report.record(CheckResult {
                probe_id: probe_id.clone(),
                phase: phase.name.clone(),
                initial_status: CheckStatus::Skipped,
                action_taken: false,
                final_status: CheckStatus::Skipped,
                message: format!("skipped: phase {culprit} failed earlier in this run"),
                duration_ms: 0,
            });
        }
    }

    /// Runs one phase; returns `true` if any check failed.
    fn run_phase(&self, phase: &Phase, mode: Mode, report: &mut VerificationReport) -> bool {
        let mut failed = false;
        let phase_start = self.ctx.clock.now();
        for probe_id in &phase.probes {
            // In-flight work is bounded by the per-call timeout; between
            // checks we enforce the phase's wall-clock budget.
            if self.ctx.clock.now() - phase_start > self.config.phase_deadline {
                let err =
                    RunError::DeadlineExceeded { scope: format!("phase {}", phase.name) };
                report.record(CheckResult {
                    probe_id: probe_id.clone(),
                    phase: phase.name.clone(),
                    initial_status: CheckStatus::Failed,
                    action_taken: false,
                    final_status: CheckStatus::Failed,
                    message: err.to_string(),
                    duration_ms: 0,
                });
                failed = true;
                continue;
            }
            let result = self.run_check(probe_id, &phase.name, mode);
            failed |= result.final_status == CheckStatus::Failed;
            report.record(result);
        }
        failed
    }

    /// Runs one check through its state machine: probe, then on failure
    /// one remediation attempt and one re-probe.
    fn run_check(&self, probe_id: &str, phase: &str, mode: Mode) -> CheckResult {
        let started = self.ctx.clock.now();
        let result = |initial, action_taken, status, message: String| CheckResult {
            probe_id: probe_id.to_string(),
            phase: phase.to_string(),
            initial_status: initial,
            action_taken,
            final_status: status,
            message,
            duration_ms: (self.ctx.clock.now() - started).num_milliseconds(),
        };

        let reason = match self.probes.run(probe_id, self.ctx, self.config.call_timeout) {
            Ok(ProbeOutcome::Pass) => {
                let description =
                    self.probes.get(probe_id).map_or("ok", |p| p.description.as_str());
                return result(
                    CheckStatus::Passed,
                    false,
                    CheckStatus::Passed,
                    description.to_string(),
                );
            }
            Ok(ProbeOutcome::Fail { reason }) => reason,
            Err(err) => {
                return result(CheckStatus::Failed, false, CheckStatus::Failed, err.to_string());
            }
        };

        let Some(action) = self.actions.for_probe(probe_id) else {
            return result(
                CheckStatus::Failed,
                false,
                CheckStatus::Failed,
                format!("{reason} (remediation: none)"),
            );
        };
        if mode == Mode::VerifyOnly {
            return result(
                CheckStatus::Failed,
                false,
                CheckStatus::Failed,
                format!("{reason} (verify-only, remediation not attempted)"),
            );
        }
        // Privilege is checked only when remediation would actually run,
        // so a converged plan re-runs cleanly without root.
        if action.needs_root && !self.ctx.host.is_root() {
            let err = RunError::Permission {
                phase: phase.to_string(),
                detail: format!("remediation {} requires root privileges", action.id),
            };
            return result(CheckStatus::Failed, false, CheckStatus::Failed, err.to_string());
        }

        let applied = self.actions.apply(&action.id, self.ctx);
        if applied == ActionOutcome::Applied && action.requires_restart {
            return result(
                CheckStatus::Failed,
                true,
                CheckStatus::RequiresRestart,
                format!("{} applied; host restart required before this check can pass", action.id),
            );
        }
        let remediation_note = match &applied {
            ActionOutcome::Applied => None,
            ActionOutcome::Failed { detail } => Some(
                RunError::Remediation { action_id: action.id.clone(), detail: detail.clone() }
                    .to_string(),
            ),
        };

        // Re-derive the final status from the probe itself; actions can
        // silently no-op or partially fail.
        match self.probes.run(probe_id, self.ctx, self.config.call_timeout) {
            Ok(ProbeOutcome::Pass) => result(
                CheckStatus::Failed,
                true,
                CheckStatus::Passed,
                format!("remediated by {}", action.id),
            ),
            Ok(ProbeOutcome::Fail { reason: still }) => {
                let message = match remediation_note {
                    Some(note) => format!("{note}; still failing: {still}"),
                    None => format!("still failing after {}: {still}", action.id),
                };
                result(CheckStatus::Failed, true, CheckStatus::Failed, message)
            }
            Err(err) => result(CheckStatus::Failed, true, CheckStatus::Failed, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake::{self, FakeClock, ShellScript};
    use crate::ports::containers::ContainerStatus;
    use chrono::Utc;

    struct Fixture {
        ctx: ServiceContext,
        handles: fake::FakeHandles,
        config: RunnerConfig,
        probes: ProbeSet,
        actions: ActionSet,
        plan: Plan,
    }

    fn fixture(doc_yaml: &str) -> Fixture {
        let (ctx, handles) = fake::context();
        let (plan, probes, actions) =
            crate::plan::PlanDocument::from_yaml(doc_yaml).unwrap().into_parts().unwrap();
        Fixture { ctx, handles, config: RunnerConfig::default(), probes, actions, plan }
    }

    fn run(fixture: &Fixture, mode: Mode) -> (VerificationReport, HashSet<String>) {
        let mut report = VerificationReport::new("run-test".into(), Utc::now());
        let runner =
            PlanRunner::new(&fixture.ctx, &fixture.config, &fixture.probes, &fixture.actions);
        let blocked = runner.run(&fixture.plan, mode, None, &mut report);
        (report, blocked)
    }

    const DOCKER_PLAN: &str = r"
phases:
  - name: docker
    critical: true
    probes: [docker_active]
probes:
  - id: docker_active
    phase: docker
    description: docker service is active
    kind: service_active
    service: docker
actions:
  - id: start_docker
    applies_to: docker_active
    kind: start_service
    service: docker
";

    const GPU_CASCADE_PLAN: &str = r"
phases:
  - name: gpu
    critical: true
    probes: [gpu_present]
  - name: gpu_container_test
    depends_on: [gpu]
    probes: [cuda_sample_ok, gpu_metrics_ok]
probes:
  - id: gpu_present
    phase: gpu
    description: a GPU is visible
    kind: gpu_present
  - id: cuda_sample_ok
    phase: gpu_container_test
    description: CUDA sample container runs
    kind: container_running
    container: cuda-sample
  - id: gpu_metrics_ok
    phase: gpu_container_test
    description: GPU metrics exporter runs
    kind: container_running
    container: gpu-metrics
";

    const BOOTSTRAP_PLAN: &str = r"
phases:
  - name: networking
    probes: [curl_present]
  - name: docker
    probes: [compose_plugin_installed, data_dir_present]
probes:
  - id: curl_present
    phase: networking
    description: curl is available
    kind: binary_present
    binary: curl
  - id: compose_plugin_installed
    phase: docker
    description: compose plugin installed
    kind: package_installed
    package: docker-compose-plugin
  - id: data_dir_present
    phase: docker
    description: data directory exists
    kind: path_exists
    path: /opt/stack/data
actions:
  - id: install_curl
    applies_to: curl_present
    kind: install_package
    package: curl
  - id: install_compose_plugin
    applies_to: compose_plugin_installed
    kind: install_package
    package: docker-compose-plugin
  - id: create_data_dir
    applies_to: data_dir_present
    kind: create_directory
    path: /opt/stack/data
";

    #[test]
    fn package_binary_and_directory_remediations_all_converge() {
        let fx = fixture(BOOTSTRAP_PLAN);
        // curl is absent until install_curl makes it resolvable.
        fx.handles
            .shell
            .lock()
            .unwrap()
            .insert("command -v curl".into(), ShellScript::Exits { code: 1, stdout: String::new() });

        let (report, blocked) = run(&fx, Mode::Converge);

        assert!(blocked.is_empty());
        for check in &report.results {
            assert_eq!(check.initial_status, CheckStatus::Failed, "{}", check.probe_id);
            assert!(check.action_taken, "{}", check.probe_id);
            assert_eq!(check.final_status, CheckStatus::Passed, "{}", check.probe_id);
        }
        let host = fx.handles.host.lock().unwrap();
        assert!(host.installed.contains("curl"));
        assert!(host.installed.contains("docker-compose-plugin"));
        drop(host);
        assert!(fx
            .handles
            .fs
            .lock()
            .unwrap()
            .dirs
            .contains(std::path::Path::new("/opt/stack/data")));
    }

    #[test]
    fn failing_probe_is_remediated_and_reverified() {
        let fx = fixture(DOCKER_PLAN);
        // docker starts inactive; the fake host activates it on start().

        let (report, blocked) = run(&fx, Mode::Converge);

        let check = &report.results[0];
        assert_eq!(check.probe_id, "docker_active");
        assert_eq!(check.initial_status, CheckStatus::Failed);
        assert!(check.action_taken);
        assert_eq!(check.final_status, CheckStatus::Passed);
        assert!(check.message.contains("start_docker"));
        assert!(blocked.is_empty());
        assert!(fx.handles.host.lock().unwrap().active.contains("docker"));
    }

    #[test]
    fn passing_probe_takes_no_action() {
        let fx = fixture(DOCKER_PLAN);
        fx.handles.host.lock().unwrap().active.insert("docker".into());

        let (report, _) = run(&fx, Mode::Converge);

        let check = &report.results[0];
        assert_eq!(check.initial_status, CheckStatus::Passed);
        assert!(!check.action_taken);
        assert_eq!(check.final_status, CheckStatus::Passed);
    }

    #[test]
    fn verify_mode_never_applies_actions() {
        let fx = fixture(DOCKER_PLAN);

        let (report, _) = run(&fx, Mode::VerifyOnly);

        let check = &report.results[0];
        assert_eq!(check.final_status, CheckStatus::Failed);
        assert!(!check.action_taken);
        assert!(!fx.handles.host.lock().unwrap().active.contains("docker"));
    }

    #[test]
    fn failed_critical_phase_skips_dependent_phase_entirely() {
        let fx = fixture(GPU_CASCADE_PLAN);
        fx.handles
            .shell
            .lock()
            .unwrap()
            .insert("nvidia-smi -L".into(), ShellScript::Exits { code: 9, stdout: String::new() });
        // The dependent containers are all down: if the runner reached
        // those probes they would record failures, not skips.
        let (report, blocked) = run(&fx, Mode::Converge);

        assert_eq!(report.results[0].final_status, CheckStatus::Failed);
        assert!(report.results[0].message.contains("remediation: none"));

        let skipped: Vec<&CheckResult> = report
            .results
            .iter()
            .filter(|r| r.final_status == CheckStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 2, "skip count must equal dependent-phase probe count");
        assert!(skipped.iter().all(|r| r.phase == "gpu_container_test"));
        assert!(blocked.contains("gpu"));
        assert!(blocked.contains("gpu_container_test"));
    }

    #[test]
    fn non_critical_failure_does_not_block_dependents() {
        let yaml = GPU_CASCADE_PLAN.replace("critical: true", "critical: false");
        let fx = fixture(&yaml);
        let mut shell = fx.handles.shell.lock().unwrap();
        shell.insert("nvidia-smi -L".into(), ShellScript::Exits { code: 9, stdout: String::new() });
        drop(shell);
        fx.handles
            .containers
            .lock()
            .unwrap()
            .statuses
            .extend([("cuda-sample".to_string(), ContainerStatus::Up), (
                "gpu-metrics".to_string(),
                ContainerStatus::Up,
            )]);

        let (report, blocked) = run(&fx, Mode::Converge);

        assert!(blocked.is_empty());
        assert_eq!(report.results[1].final_status, CheckStatus::Passed);
        assert_eq!(report.results[2].final_status, CheckStatus::Passed);
    }

    #[test]
    fn missing_root_fails_the_check_before_its_action_runs() {
        let yaml = DOCKER_PLAN.replace("kind: start_service", "needs_root: true\n    kind: start_service");
        let fx = fixture(&yaml);
        // host.root defaults to false in the fake

        let (report, blocked) = run(&fx, Mode::Converge);

        let check = &report.results[0];
        assert_eq!(check.final_status, CheckStatus::Failed);
        assert!(!check.action_taken);
        assert!(check.message.contains("root"));
        assert!(blocked.contains("docker"));
        assert!(!fx.handles.host.lock().unwrap().active.contains("docker"));
    }

    #[test]
    fn converged_host_passes_without_root() {
        let yaml = DOCKER_PLAN.replace("kind: start_service", "needs_root: true\n    kind: start_service");
        let fx = fixture(&yaml);
        fx.handles.host.lock().unwrap().active.insert("docker".into());

        let (report, blocked) = run(&fx, Mode::Converge);

        // Nothing needs remediation, so privilege is never consulted.
        assert_eq!(report.results[0].final_status, CheckStatus::Passed);
        assert!(blocked.is_empty());
    }

    #[test]
    fn verify_mode_ignores_privilege_requirements() {
        let yaml = DOCKER_PLAN.replace("kind: start_service", "needs_root: true\n    kind: start_service");
        let fx = fixture(&yaml);
        fx.handles.host.lock().unwrap().active.insert("docker".into());

        let (report, _) = run(&fx, Mode::VerifyOnly);
        assert_eq!(report.results[0].final_status, CheckStatus::Passed);
    }

    #[test]
    fn restart_requiring_action_ends_terminal_without_recheck() {
        let yaml = DOCKER_PLAN.replace(
            "kind: start_service",
            "requires_restart: true\n    kind: start_service",
        );
        let fx = fixture(&yaml);

        let (report, blocked) = run(&fx, Mode::Converge);

        let check = &report.results[0];
        assert_eq!(check.final_status, CheckStatus::RequiresRestart);
        assert!(check.action_taken);
        assert!(check.message.contains("restart"));
        // Not a failure: a critical phase awaiting restart does not block.
        assert!(blocked.is_empty());
    }

    #[test]
    fn failed_remediation_still_rechecks_the_probe() {
        let fx = fixture(DOCKER_PLAN);
        fx.handles
            .host
            .lock()
            .unwrap()
            .failing_starts
            .insert("docker".into(), "unit masked".into());

        let (report, _) = run(&fx, Mode::Converge);

        let check = &report.results[0];
        assert_eq!(check.final_status, CheckStatus::Failed);
        assert!(check.action_taken);
        assert!(check.message.contains("remediation start_docker failed"));
        assert!(check.message.contains("still failing"));
    }

    #[test]
    fn remediation_is_attempted_exactly_once_per_run() {
        let yaml = r"
phases:
  - name: containers
    probes: [app_running]
probes:
  - id: app_running
    phase: containers
    description: app container is running
    kind: container_running
    container: app
actions:
  - id: apply_stack_app
    applies_to: app_running
    kind: apply_declared_containers
";
        let fx = fixture(yaml);
        fx.handles.containers.lock().unwrap().apply_failure = Some("pull failed".into());

        let (report, _) = run(&fx, Mode::Converge);

        assert_eq!(report.results[0].final_status, CheckStatus::Failed);
        assert_eq!(fx.handles.containers.lock().unwrap().apply_calls, 1);
    }

    #[test]
    fn probe_execution_error_fails_the_check_and_run_continues() {
        let yaml = r"
phases:
  - name: gpu
    probes: [gpu_present, nvidia_smi_present]
probes:
  - id: gpu_present
    phase: gpu
    description: a GPU is visible
    kind: gpu_present
  - id: nvidia_smi_present
    phase: gpu
    description: nvidia-smi resolves
    kind: binary_present
    binary: nvidia-smi
";
        let fx = fixture(yaml);
        let mut shell = fx.handles.shell.lock().unwrap();
        shell.insert("nvidia-smi -L".into(), ShellScript::FailsToSpawn("sh exploded".into()));
        shell.insert(
            "command -v nvidia-smi".into(),
            ShellScript::Exits { code: 0, stdout: "/usr/bin/nvidia-smi".into() },
        );
        drop(shell);

        let (report, _) = run(&fx, Mode::Converge);

        assert_eq!(report.results[0].final_status, CheckStatus::Failed);
        assert!(report.results[0].message.contains("could not execute"));
        assert_eq!(report.results[1].final_status, CheckStatus::Passed);
    }

    #[test]
    fn phase_deadline_fails_remaining_checks() {
        let yaml = r"
phases:
  - name: docker
    probes: [docker_active, compose_plugin_installed]
probes:
  - id: docker_active
    phase: docker
    description: docker service is active
    kind: service_active
    service: docker
  - id: compose_plugin_installed
    phase: docker
    description: compose plugin installed
    kind: package_installed
    package: docker-compose-plugin
";
        let mut fx = fixture(yaml);
        fx.handles.host.lock().unwrap().active.insert("docker".into());
        fx.handles.host.lock().unwrap().installed.insert("docker-compose-plugin".into());
        // Every clock reading advances ten minutes against a 15 minute
        // budget: the first check runs, the second lands past deadline.
        fx.ctx.clock = Box::new(FakeClock::stepping(chrono::Duration::minutes(10)));
        fx.config.phase_deadline = chrono::Duration::minutes(15);

        let (report, _) = run(&fx, Mode::Converge);

        assert_eq!(report.results[0].final_status, CheckStatus::Passed);
        assert_eq!(report.results[1].final_status, CheckStatus::Failed);
        assert!(report.results[1].message.contains("deadline exceeded"));
    }

    #[test]
    fn single_phase_filter_runs_only_that_phase() {
        let fx = fixture(GPU_CASCADE_PLAN);
        fx.handles
            .containers
            .lock()
            .unwrap()
            .statuses
            .extend([("cuda-sample".to_string(), ContainerStatus::Up), (
                "gpu-metrics".to_string(),
                ContainerStatus::Up,
            )]);

        let mut report = VerificationReport::new("run-test".into(), Utc::now());
        let runner = PlanRunner::new(&fx.ctx, &fx.config, &fx.probes, &fx.actions);
        runner.run(&fx.plan, Mode::Converge, Some("gpu_container_test"), &mut report);

        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|r| r.phase == "gpu_container_test"));
    }

    #[test]
    fn results_preserve_declared_order() {
        let fx = fixture(GPU_CASCADE_PLAN);
        fx.handles
            .shell
            .lock()
            .unwrap()
            .insert("nvidia-smi -L".into(), ShellScript::Exits { code: 9, stdout: String::new() });

        let (report, _) = run(&fx, Mode::Converge);

        let ids: Vec<&str> = report.results.iter().map(|r| r.probe_id.as_str()).collect();
        assert_eq!(ids, ["gpu_present", "cuda_sample_ok", "gpu_metrics_ok"]);
    }
}
