//! Subresource Integrity check.
//!
//! Covers `<script src>` and `<link rel="stylesheet" href>` whose resolved URL
//! lies outside the page origin. Protocol-relative `//host/..` references are
//! resolved first, so CDN assets written that way are covered too.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer,
};

pub const NAME: &str = "sri";
pub const TITLE: &str = "Subresource Integrity (SRI) Check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SriConfig {
    /// Report missing `crossorigin` alongside missing `integrity`.
    pub check_crossorigin: bool,
}

impl Default for SriConfig {
    fn default() -> Self {
        Self {
            check_crossorigin: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Script => "JavaScript",
            AssetKind::Stylesheet => "CSS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalAsset {
    pub kind: AssetKind,
    pub url: String,
    pub has_integrity: bool,
    pub has_crossorigin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SriSnapshot {
    /// Scripts first, then stylesheets, each in document order.
    pub assets: Vec<ExternalAsset>,
}

fn present(attr: &Option<String>) -> bool {
    attr.as_deref().is_some_and(|v| !v.is_empty())
}

pub struct SriCollector;

#[async_trait]
impl Collector for SriCollector {
    type Raw = SriSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<SriSnapshot>> {
        let doc = ctx.document();
        let location = ctx.location();

        let scripts = doc.external_scripts().filter_map(|s| {
            s.src.as_deref().map(|src| ExternalAsset {
                kind: AssetKind::Script,
                url: location.absolute(src),
                has_integrity: present(&s.integrity),
                has_crossorigin: present(&s.crossorigin),
            })
        });
        let styles = doc.stylesheet_links().filter_map(|l| {
            l.href.as_deref().map(|href| ExternalAsset {
                kind: AssetKind::Stylesheet,
                url: location.absolute(href),
                has_integrity: present(&l.integrity),
                has_crossorigin: present(&l.crossorigin),
            })
        });

        let assets = scripts
            .chain(styles)
            .filter(|a| !location.is_same_origin(&a.url))
            .collect();

        Ok(Collected::complete(SriSnapshot { assets }))
    }
}

pub struct SriScorer {
    config: SriConfig,
}

impl Scorer for SriScorer {
    type Raw = SriSnapshot;

    fn score(&self, raw: &SriSnapshot) -> ScoringResult<Vec<Finding>> {
        let mut findings: Vec<Finding> = raw
            .assets
            .iter()
            .filter(|a| !a.has_integrity)
            .map(|a| {
                Finding::warn(
                    "missing-integrity",
                    format!("{} {} has no integrity attribute", a.kind.label(), a.url),
                )
                .with_metric("type", a.kind.label())
                .with_metric("url", a.url.as_str())
            })
            .collect();

        if self.config.check_crossorigin {
            findings.extend(raw.assets.iter().filter(|a| !a.has_crossorigin).map(|a| {
                Finding::info(
                    "missing-crossorigin",
                    format!("{} {} has no crossorigin attribute", a.kind.label(), a.url),
                )
                .with_metric("type", a.kind.label())
                .with_metric("url", a.url.as_str())
            }));
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &SriConfig) -> ModuleDescriptor {
    ModuleDescriptor::new(
        SriCollector,
        SriScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}
