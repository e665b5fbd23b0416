//! Built-in registries.
//!
//! - `core`: seo, jsCss, dependencies, security
//! - `extended`: accessibility, performance, storage, pwa, dnsTls, sri
//! - `full`: core followed by extended

use sitediag_core::Registry;

use crate::config::ChecksConfig;
use crate::error::ChecksResult;
use crate::modules::{
    accessibility, dependencies, dns_tls, js_css, performance, pwa, security, seo, sri, storage,
};

/// Names of the core modules, in registration order.
pub const CORE_MODULES: [&str; 4] = [seo::NAME, js_css::NAME, dependencies::NAME, security::NAME];

/// Names of the extended modules, in registration order.
pub const EXTENDED_MODULES: [&str; 6] = [
    accessibility::NAME,
    performance::NAME,
    storage::NAME,
    pwa::NAME,
    dns_tls::NAME,
    sri::NAME,
];

fn register_core(registry: &mut Registry, config: &ChecksConfig) -> ChecksResult<()> {
    let timeout = config.probe_timeout();
    registry.register(seo::NAME, seo::descriptor(&config.seo, timeout))?;
    registry.register(js_css::NAME, js_css::descriptor(&config.js_css, timeout))?;
    registry.register(
        dependencies::NAME,
        dependencies::descriptor(&config.dependencies),
    )?;
    registry.register(security::NAME, security::descriptor(&config.security, timeout))?;
    Ok(())
}

fn register_extended(registry: &mut Registry, config: &ChecksConfig) -> ChecksResult<()> {
    let timeout = config.probe_timeout();
    registry.register(
        accessibility::NAME,
        accessibility::descriptor(&config.accessibility),
    )?;
    registry.register(
        performance::NAME,
        performance::descriptor(&config.performance),
    )?;
    registry.register(storage::NAME, storage::descriptor(&config.storage)?)?;
    registry.register(pwa::NAME, pwa::descriptor(&config.pwa))?;
    registry.register(dns_tls::NAME, dns_tls::descriptor(&config.dns_tls, timeout))?;
    registry.register(sri::NAME, sri::descriptor(&config.sri))?;
    Ok(())
}

/// SEO, JS/CSS, third-party risk and security headers.
pub fn core_registry(config: &ChecksConfig) -> ChecksResult<Registry> {
    let mut registry = Registry::new();
    register_core(&mut registry, config)?;
    Ok(registry)
}

/// Accessibility, performance, storage, PWA, DNS/TLS and SRI.
pub fn extended_registry(config: &ChecksConfig) -> ChecksResult<Registry> {
    let mut registry = Registry::new();
    register_extended(&mut registry, config)?;
    Ok(registry)
}

/// Every built-in module.
pub fn full_registry(config: &ChecksConfig) -> ChecksResult<Registry> {
    let mut registry = Registry::new();
    register_core(&mut registry, config)?;
    register_extended(&mut registry, config)?;
    Ok(registry)
}
