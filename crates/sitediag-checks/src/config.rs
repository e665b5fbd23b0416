//! Configuration for the built-in modules.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitediag_core::DEFAULT_PROBE_TIMEOUT;

use crate::error::ChecksResult;
use crate::modules::accessibility::AccessibilityConfig;
use crate::modules::dependencies::DependenciesConfig;
use crate::modules::dns_tls::DnsTlsConfig;
use crate::modules::js_css::JsCssConfig;
use crate::modules::performance::PerformanceConfig;
use crate::modules::pwa::PwaConfig;
use crate::modules::security::SecurityConfig;
use crate::modules::seo::SeoConfig;
use crate::modules::sri::SriConfig;
use crate::modules::storage::StorageConfig;

/// Settings shared by every module plus one section per module.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChecksConfig {
    /// Upper bound for a single HEAD probe.
    pub probe_timeout_ms: u64,
    pub seo: SeoConfig,
    pub js_css: JsCssConfig,
    pub dependencies: DependenciesConfig,
    pub security: SecurityConfig,
    pub accessibility: AccessibilityConfig,
    pub performance: PerformanceConfig,
    pub storage: StorageConfig,
    pub pwa: PwaConfig,
    pub dns_tls: DnsTlsConfig,
    pub sri: SriConfig,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            seo: SeoConfig::default(),
            js_css: JsCssConfig::default(),
            dependencies: DependenciesConfig::default(),
            security: SecurityConfig::default(),
            accessibility: AccessibilityConfig::default(),
            performance: PerformanceConfig::default(),
            storage: StorageConfig::default(),
            pwa: PwaConfig::default(),
            dns_tls: DnsTlsConfig::default(),
            sri: SriConfig::default(),
        }
    }
}

impl ChecksConfig {
    /// Parse a JSON document. Missing sections keep their defaults.
    pub fn from_json(json: &str) -> ChecksResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
