//! Module registry.
//!
//! The [`Registry`] holds named modules in registration order. Names are
//! unique; entries are append-only.

use crate::error::{RegistryError, RegistryResult};
use crate::module::ModuleDescriptor;

/// Registered modules, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: Vec<(String, ModuleDescriptor)>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under `name`.
    ///
    /// Fails with [`RegistryError::DuplicateModule`] if the name is taken;
    /// the registry is left unchanged.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        descriptor: ModuleDescriptor,
    ) -> RegistryResult<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(RegistryError::DuplicateModule(name));
        }
        self.entries.push((name, descriptor));
        Ok(())
    }

    /// Look up a module by name.
    pub fn get(&self, name: &str) -> RegistryResult<&ModuleDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterate over `(name, module)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleDescriptor)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
