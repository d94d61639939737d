//! Verification report: per-check results, totals, and rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// The probe passed, either initially or after remediation.
    Passed,
    /// The probe failed and remediation did not (or could not) fix it.
    Failed,
    /// The check never ran because a prior critical phase failed.
    Skipped,
    /// Remediation applied but the host must restart before the probe
    /// can pass. Listed separately; never counted as failed.
    RequiresRestart,
}

impl CheckStatus {
    fn label(self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
            Self::RequiresRestart => "RESTART",
        }
    }
}

/// Outcome of one check. Immutable once recorded; `final_status` is
/// always re-derived by re-running the probe, never inferred from the
/// action's own success flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// The probe that was checked.
    pub probe_id: String,
    /// The phase the probe ran in.
    pub phase: String,
    /// Status of the first probe run.
    pub initial_status: CheckStatus,
    /// Whether a remediation action was applied.
    pub action_taken: bool,
    /// Status after the post-action re-check (or the initial status when
    /// no action ran).
    pub final_status: CheckStatus,
    /// Free-text diagnostic.
    pub message: String,
    /// Wall-clock duration of the check in milliseconds.
    pub duration_ms: i64,
}

/// Aggregate counts over a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Checks that passed.
    pub passed: u32,
    /// Checks that failed.
    pub failed: u32,
    /// Checks that never ran.
    pub skipped: u32,
    /// Checks waiting on a host restart.
    pub requires_restart: u32,
}

/// Structured outcome of a full run.
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    /// Unique id of this run.
    pub run_id: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Per-check results in execution order.
    pub results: Vec<CheckResult>,
    /// Non-fatal warnings (optional endpoints that timed out).
    pub warnings: Vec<String>,
}

/// Frozen summary produced by [`VerificationReport::finalize`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Aggregate counts.
    pub totals: Totals,
    /// `passed / (passed + failed)`; skipped and restart-pending checks
    /// do not enter the rate.
    pub success_rate: f64,
    /// `0` iff no check failed.
    pub exit_code: i32,
}

impl VerificationReport {
    /// Creates an empty report for a new run.
    #[must_use]
    pub fn new(run_id: String, started_at: DateTime<Utc>) -> Self {
        Self { run_id, started_at, results: Vec::new(), warnings: Vec::new() }
    }

    /// Appends a check result.
    pub fn record(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// Appends a non-fatal warning.
    pub fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Computes aggregate counts over the recorded results.
    #[must_use]
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for result in &self.results {
            match result.final_status {
                CheckStatus::Passed => totals.passed += 1,
                CheckStatus::Failed => totals.failed += 1,
                CheckStatus::Skipped => totals.skipped += 1,
                CheckStatus::RequiresRestart => totals.requires_restart += 1,
            }
        }
        totals
    }

    /// Freezes the report into a summary with the process exit code.
    #[must_use]
    pub fn finalize(&self) -> ReportSummary {
        let totals = self.totals();
        let attempted = totals.passed + totals.failed;
        let success_rate =
            if attempted == 0 { 1.0 } else { f64::from(totals.passed) / f64::from(attempted) };
        ReportSummary {
            totals,
            success_rate,
            exit_code: i32::from(totals.failed != 0),
        }
    }
}

/// Renders the report as a line-oriented human-readable log.
#[must_use]
pub fn render_text(report: &VerificationReport, summary: &ReportSummary) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Run {} started {}", report.run_id, report.started_at.to_rfc3339()));
    lines.push(String::new());

    let mut current_phase = "";
    for result in &report.results {
        if result.phase != current_phase {
            current_phase = &result.phase;
            lines.push(format!("{current_phase}:"));
        }
        let marker = if result.action_taken { " (remediated)" } else { "" };
        lines.push(format!(
            "  [{:<7}] {}{marker} — {}",
            result.final_status.label(),
            result.probe_id,
            result.message,
        ));
    }

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push("warnings:".to_string());
        for warning in &report.warnings {
            lines.push(format!("  - {warning}"));
        }
    }

    let totals = summary.totals;
    lines.push(String::new());
    lines.push(format!(
        "{} passed, {} failed, {} skipped, {} awaiting restart — {:.0}% success",
        totals.passed,
        totals.failed,
        totals.skipped,
        totals.requires_restart,
        summary.success_rate * 100.0,
    ));
    lines.join("\n")
}

/// Renders the report and summary as a single JSON document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(report: &VerificationReport, summary: &ReportSummary) -> Result<String, String> {
    #[derive(Serialize)]
    struct Document<'a> {
        #[serde(flatten)]
        report: &'a VerificationReport,
        summary: &'a ReportSummary,
    }
    serde_json::to_string_pretty(&Document { report, summary })
        .map_err(|e| format!("failed to serialize report: {e}"))
}
