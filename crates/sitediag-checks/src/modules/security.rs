//! Security & privacy headers audit.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    probe, Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer, Severity,
};

pub const NAME: &str = "security";
pub const TITLE: &str = "Security Headers Audit";

/// One response header the page is expected to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub name: String,
    pub severity: Severity,
    pub purpose: String,
}

impl HeaderRule {
    fn new(name: &str, severity: Severity, purpose: &str) -> Self {
        Self {
            name: name.to_string(),
            severity,
            purpose: purpose.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    /// Checked in order; one finding per missing header.
    pub headers: Vec<HeaderRule>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            headers: vec![
                HeaderRule::new(
                    "content-security-policy",
                    Severity::Critical,
                    "Prevents XSS by restricting sources of scripts and content",
                ),
                HeaderRule::new(
                    "strict-transport-security",
                    Severity::Critical,
                    "Enforces HTTPS connections",
                ),
                HeaderRule::new("x-frame-options", Severity::Warn, "Prevents clickjacking"),
                HeaderRule::new(
                    "x-content-type-options",
                    Severity::Warn,
                    "Prevents MIME-sniffing attacks",
                ),
                HeaderRule::new(
                    "referrer-policy",
                    Severity::Warn,
                    "Controls how much referrer data is sent",
                ),
                HeaderRule::new(
                    "permissions-policy",
                    Severity::Info,
                    "Restricts browser APIs like camera and microphone",
                ),
                HeaderRule::new(
                    "cross-origin-resource-policy",
                    Severity::Info,
                    "Protects against data leaks to other origins",
                ),
                HeaderRule::new(
                    "cross-origin-opener-policy",
                    Severity::Info,
                    "Mitigates cross-origin leaks in shared browsing contexts",
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSnapshot {
    pub status: u16,
    /// Lower-cased names.
    pub headers: BTreeMap<String, String>,
}

pub struct SecurityCollector {
    probe_timeout: Duration,
}

#[async_trait]
impl Collector for SecurityCollector {
    type Raw = HeaderSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<HeaderSnapshot>> {
        let resp = probe::head(ctx, &ctx.location().href, self.probe_timeout).await?;
        Ok(Collected::complete(HeaderSnapshot {
            status: resp.status,
            headers: resp.headers,
        }))
    }
}

pub struct SecurityScorer {
    config: SecurityConfig,
}

impl Scorer for SecurityScorer {
    type Raw = HeaderSnapshot;

    fn score(&self, raw: &HeaderSnapshot) -> ScoringResult<Vec<Finding>> {
        let findings = self
            .config
            .headers
            .iter()
            .filter(|rule| {
                raw.headers
                    .get(&rule.name.to_ascii_lowercase())
                    .map_or(true, |v| v.trim().is_empty())
            })
            .map(|rule| {
                Finding::new(
                    "missing-security-header",
                    rule.severity,
                    format!("Missing {}: {}", rule.name, rule.purpose),
                )
                .with_metric("header", rule.name.as_str())
            })
            .collect();
        Ok(findings)
    }
}

pub fn descriptor(config: &SecurityConfig, probe_timeout: Duration) -> ModuleDescriptor {
    ModuleDescriptor::new(
        SecurityCollector { probe_timeout },
        SecurityScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}
