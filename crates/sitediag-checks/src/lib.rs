//! Built-in diagnostic modules for sitediag.
//!
//! Every module is a collector (reads the [`PageContext`]) plus a pure
//! scorer (turns the raw snapshot into findings), configured through
//! [`ChecksConfig`]. The [`registries`] module bundles them into the
//! `core`, `extended` and `full` registries.
//!
//! [`PageContext`]: sitediag_core::PageContext

pub mod config;
pub mod error;
pub mod modules;
pub mod registries;

pub use config::ChecksConfig;
pub use error::{ChecksError, ChecksResult};
pub use registries::{
    core_registry, extended_registry, full_registry, CORE_MODULES, EXTENDED_MODULES,
};
