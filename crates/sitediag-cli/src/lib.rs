//! Support code for the `sitediag` binary: configuration loading, captured
//! page snapshots, live HEAD probes and report rendering.

pub mod config;
pub mod prober;
pub mod render;
pub mod snapshot;

use clap::ValueEnum;
use sitediag_checks::{core_registry, extended_registry, full_registry, ChecksConfig, ChecksResult};
use sitediag_core::Registry;

pub use config::{ConfigError, SitediagConfig};
pub use prober::HttpProber;
pub use render::{render_list, render_report, render_run, OutputFormat};
pub use snapshot::{PageSnapshot, SnapshotContext, SnapshotError};

/// Which built-in module set to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RegistryKind {
    /// SEO, JS/CSS, third-party dependencies, security headers.
    Core,
    /// Accessibility, performance, storage, PWA, DNS/TLS, SRI.
    Extended,
    #[default]
    Full,
}

pub fn build_registry(kind: RegistryKind, config: &ChecksConfig) -> ChecksResult<Registry> {
    match kind {
        RegistryKind::Core => core_registry(config),
        RegistryKind::Extended => extended_registry(config),
        RegistryKind::Full => full_registry(config),
    }
}
