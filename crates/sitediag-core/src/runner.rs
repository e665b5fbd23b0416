//! Module execution with failure isolation.
//!
//! [`Runner::run`] executes one module, [`Runner::run_all`] executes every
//! registered module. Any collector or scorer failure becomes a `failed`
//! [`Report`]; only registry misuse is returned as an error.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::context::PageContext;
use crate::error::RegistryResult;
use crate::metrics::METRICS;
use crate::module::ModuleDescriptor;
use crate::obs::{
    emit_module_failed, emit_module_finished, emit_module_started, emit_run_all_finished,
    module_span,
};
use crate::registry::Registry;
use crate::report::{Report, RunResult};

/// Configuration for batch execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Maximum number of modules in flight during `run_all`. `1` runs them
    /// strictly one after another.
    pub max_concurrent: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// Executes modules from a [`Registry`].
#[derive(Debug)]
pub struct Runner {
    registry: Registry,
    config: RunnerConfig,
}

impl Runner {
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, RunnerConfig::default())
    }

    pub fn with_config(registry: Registry, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Registered module names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Run a single module.
    ///
    /// Fails only with `UnknownModule`, before any collector runs. Module
    /// failures are reported through the returned [`Report`].
    pub async fn run(&self, name: &str, ctx: &dyn PageContext) -> RegistryResult<Report> {
        let module = self.registry.get(name)?;
        Ok(execute_module(name, module, ctx).await)
    }

    /// Run every registered module.
    ///
    /// Modules may overlap (bounded by `max_concurrent`) but reports come
    /// back in registration order regardless of completion order.
    pub async fn run_all(&self, ctx: &dyn PageContext) -> RunResult {
        let limit = self.config.max_concurrent.max(1);

        let reports: Vec<Report> = stream::iter(self.registry.iter())
            .map(|(name, module)| execute_module(name, module, ctx))
            .buffered(limit)
            .collect()
            .await;

        let result = RunResult::new(reports);
        emit_run_all_finished(
            &result.run_id.to_string(),
            result.reports.len(),
            &result.summary,
        );
        result
    }
}

async fn execute_module(name: &str, module: &ModuleDescriptor, ctx: &dyn PageContext) -> Report {
    let started_at = Utc::now();
    emit_module_started(name);
    METRICS.record_module_run();

    let outcome = module.execute(ctx).instrument(module_span(name)).await;
    let finished_at = Utc::now();

    let report = match outcome {
        Ok(output) => Report::completed(
            name,
            output.findings,
            output.degraded,
            started_at,
            finished_at,
        ),
        Err(e) => {
            emit_module_failed(name, &e);
            METRICS.record_module_failure();
            Report::failed(name, &e, started_at, finished_at)
        }
    };

    emit_module_finished(
        name,
        report.status,
        report.findings.len(),
        report.duration_ms(),
    );
    report
}
