//! sitediag core library
//!
//! A diagnostic-module runner: independent checks plug in as
//! collector/scorer pairs, each producing a structured [`Report`] instead of
//! console text.
//!
//! - [`context`]: `PageContext`, the read-only environment collaborator
//! - [`document`]: the page model collectors query
//! - [`finding`] / [`report`]: `Finding`, `Report`, `RunResult`
//! - [`module`]: `Collector`, `Scorer`, `ModuleDescriptor`
//! - [`registry`] / [`runner`]: `Registry`, `Runner`
//! - [`probe`] / [`cancel`]: bounded, cancellable HEAD probes

pub mod cancel;
pub mod context;
pub mod document;
pub mod error;
pub mod fakes;
pub mod finding;
pub mod metrics;
pub mod module;
pub mod obs;
pub mod probe;
pub mod registry;
pub mod report;
pub mod runner;
pub mod telemetry;

pub use cancel::CancellationToken;
pub use context::{
    Location, NavigationTiming, PageContext, ProbeResponse, ResourceEntry, ServiceWorkerInfo,
    StorageEntry,
};
pub use document::{
    Anchor, Document, Element, Image, InlineStyle, LinkTag, MetaTag, Script, StyleSheet,
};
pub use error::{
    CollectionCause, CollectionError, CollectionResult, ModuleError, RegistryError,
    RegistryResult, ScoringError, ScoringResult,
};
pub use finding::{Finding, MetricValue, Severity};
pub use metrics::{MetricsSnapshot, METRICS};
pub use module::{Collected, Collector, ModuleDescriptor, ModuleOutput, Scorer};
pub use probe::DEFAULT_PROBE_TIMEOUT;
pub use registry::Registry;
pub use report::{ErrorInfo, ErrorKind, Report, ReportStatus, RunResult, RunSummary};
pub use runner::{Runner, RunnerConfig};
pub use telemetry::init_tracing;

/// sitediag version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
