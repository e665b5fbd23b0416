//! Performance timing and resource audit.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, NavigationTiming,
    PageContext, ResourceEntry, ScoringResult, Scorer,
};

use super::kb_to_bytes;

pub const NAME: &str = "performance";
pub const TITLE: &str = "Performance Timing Overview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceConfig {
    pub ttfb_ms: f64,
    pub dom_load_ms: f64,
    pub page_load_ms: f64,
    pub slow_resource_ms: f64,
    #[serde(rename = "largeResourceKB")]
    pub large_resource_kb: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            ttfb_ms: 200.0,
            dom_load_ms: 2500.0,
            page_load_ms: 4000.0,
            slow_resource_ms: 500.0,
            large_resource_kb: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerformanceSnapshot {
    pub timing: Option<NavigationTiming>,
    pub resources: Vec<ResourceEntry>,
}

pub struct PerformanceCollector;

#[async_trait]
impl Collector for PerformanceCollector {
    type Raw = PerformanceSnapshot;

    async fn collect(
        &self,
        ctx: &dyn PageContext,
    ) -> CollectionResult<Collected<PerformanceSnapshot>> {
        let timing = ctx.navigation_timing().copied();
        let mut degraded = Vec::new();
        match &timing {
            None => degraded.push("navigation timing is unavailable".to_string()),
            Some(t) if !t.is_complete() => {
                degraded.push("page load has not finished; total load time unknown".to_string())
            }
            Some(_) => {}
        }

        Ok(Collected::degraded(
            PerformanceSnapshot {
                timing,
                resources: ctx.resources().to_vec(),
            },
            degraded,
        ))
    }
}

pub struct PerformanceScorer {
    config: PerformanceConfig,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl Scorer for PerformanceScorer {
    type Raw = PerformanceSnapshot;

    fn score(&self, raw: &PerformanceSnapshot) -> ScoringResult<Vec<Finding>> {
        let cfg = &self.config;
        let mut findings = Vec::new();

        if let Some(t) = &raw.timing {
            let ttfb = t.ttfb_ms();
            if ttfb > cfg.ttfb_ms {
                findings.push(
                    Finding::warn(
                        "slow-ttfb",
                        format!("TTFB is {:.0} ms; aim for under {:.0} ms", ttfb, cfg.ttfb_ms),
                    )
                    .with_metric("ttfbMs", round1(ttfb)),
                );
            }

            let dom = t.dom_load_ms();
            if t.dom_content_loaded_event_end > 0.0 && dom > cfg.dom_load_ms {
                findings.push(
                    Finding::info(
                        "slow-dom-load",
                        format!("DOMContentLoaded after {dom:.0} ms"),
                    )
                    .with_metric("domLoadMs", round1(dom)),
                );
            }

            let total = t.total_load_ms();
            if t.is_complete() && total > cfg.page_load_ms {
                findings.push(
                    Finding::warn(
                        "slow-page-load",
                        format!("Page load took {total:.0} ms; defer non-critical assets"),
                    )
                    .with_metric("totalLoadMs", round1(total)),
                );
            }
        }

        let slow: Vec<&ResourceEntry> = raw
            .resources
            .iter()
            .filter(|r| r.duration > cfg.slow_resource_ms)
            .collect();
        if let Some(slowest) = slow
            .iter()
            .max_by(|a, b| a.duration.total_cmp(&b.duration))
        {
            findings.push(
                Finding::info(
                    "slow-resources",
                    format!(
                        "{} request(s) slower than {:.0} ms",
                        slow.len(),
                        cfg.slow_resource_ms
                    ),
                )
                .with_metric("count", slow.len())
                .with_metric("slowest", slowest.name.as_str())
                .with_metric("slowestMs", round1(slowest.duration)),
            );
        }

        let limit = kb_to_bytes(cfg.large_resource_kb);
        let large: Vec<&ResourceEntry> = raw
            .resources
            .iter()
            .filter(|r| r.transfer_size > limit)
            .collect();
        if let Some(largest) = large.iter().max_by_key(|r| r.transfer_size) {
            findings.push(
                Finding::warn(
                    "large-resources",
                    format!(
                        "{} file(s) larger than {} KB; compress or lazy-load them",
                        large.len(),
                        cfg.large_resource_kb
                    ),
                )
                .with_metric("count", large.len())
                .with_metric("largest", largest.name.as_str())
                .with_metric("largestBytes", largest.transfer_size),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &PerformanceConfig) -> ModuleDescriptor {
    ModuleDescriptor::new(
        PerformanceCollector,
        PerformanceScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}
