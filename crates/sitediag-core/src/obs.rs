//! Structured observability hooks for module lifecycle events.
//!
//! Each module run is instrumented with [`module_span`]; the `emit_*`
//! functions log start, finish, failure and batch completion.
//!
//! Events are emitted at `info!` level, failures at `warn!`.

use tracing::{info, warn};

use crate::report::{ReportStatus, RunSummary};

/// Span tagged with the module name.
pub fn module_span(module: &str) -> tracing::Span {
    tracing::info_span!("sitediag.module", module = %module)
}

/// Emit event: module started.
pub fn emit_module_started(module: &str) {
    info!(event = "module.started", module = %module);
}

/// Emit event: module finished with its status and finding count.
pub fn emit_module_finished(module: &str, status: ReportStatus, findings: usize, duration_ms: u64) {
    info!(
        event = "module.finished",
        module = %module,
        status = %status,
        findings = findings,
        duration_ms = duration_ms,
    );
}

/// Emit event: module failed (warning level).
pub fn emit_module_failed(module: &str, error: &dyn std::fmt::Display) {
    warn!(event = "module.failed", module = %module, error = %error);
}

/// Emit event: batch run finished.
pub fn emit_run_all_finished(run_id: &str, modules: usize, summary: &RunSummary) {
    info!(
        event = "run_all.finished",
        run_id = %run_id,
        modules = modules,
        findings = summary.total,
        failed = summary.status_count(ReportStatus::Failed),
    );
}
