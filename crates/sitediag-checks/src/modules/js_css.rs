//! JS & CSS efficiency check.
//!
//! External asset sizes come from HEAD `content-length`, probed concurrently,
//! with resource timing `transferSize` as the fallback. Unused CSS is a
//! substring heuristic: a rule counts as used when its selector text mentions
//! any `.class` or `#id` present in the document.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    probe, Collected, CollectionResult, Collector, Document, Finding, ModuleDescriptor,
    PageContext, ResourceEntry, ScoringResult, Scorer,
};
use tracing::debug;

use super::{kb_to_bytes, total_bytes};

pub const NAME: &str = "jsCss";
pub const TITLE: &str = "JS & CSS Efficiency Check";

/// Thresholds. Kilobyte values are multiplied by 1000.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsCssConfig {
    /// Total external JS above which `large-js-payload` fires.
    #[serde(rename = "thresholdKB")]
    pub threshold_kb: u64,
    #[serde(rename = "cssThresholdKB")]
    pub css_threshold_kb: u64,
    /// Per-file limit for `large-script-files`.
    #[serde(rename = "scriptFileThresholdKB")]
    pub script_file_threshold_kb: u64,
    pub max_inline_scripts: usize,
    pub max_inline_styles: usize,
    pub unused_css_percent: u64,
    /// HEAD every external asset for its size.
    pub probe_sizes: bool,
}

impl Default for JsCssConfig {
    fn default() -> Self {
        Self {
            threshold_kb: 1000,
            css_threshold_kb: 300,
            script_file_threshold_kb: 300,
            max_inline_scripts: 10,
            max_inline_styles: 5,
            unused_css_percent: 40,
            probe_sizes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptAsset {
    pub src: String,
    pub render_blocking: bool,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsCssSnapshot {
    /// External scripts in document order, duplicates included.
    pub scripts: Vec<ScriptAsset>,
    pub total_script_bytes: u64,
    pub inline_script_count: usize,
    pub inline_script_bytes: u64,
    pub stylesheet_count: usize,
    pub total_css_bytes: u64,
    pub inline_style_count: usize,
    pub inline_style_bytes: u64,
    pub css_rule_count: usize,
    pub unused_css_rule_count: usize,
    pub long_task_count: usize,
}

impl JsCssSnapshot {
    /// Percentage of readable CSS rules that look unused, rounded.
    pub fn unused_css_percent(&self) -> u64 {
        if self.css_rule_count == 0 {
            return 0;
        }
        ((self.unused_css_rule_count as f64 / self.css_rule_count as f64) * 100.0).round() as u64
    }

    /// Script URLs imported more than once, in first-seen order.
    pub fn duplicate_scripts(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dups: Vec<&str> = Vec::new();
        for script in &self.scripts {
            if !seen.insert(script.src.as_str()) && !dups.contains(&script.src.as_str()) {
                dups.push(&script.src);
            }
        }
        dups
    }
}

pub struct JsCssCollector {
    probe_sizes: bool,
    probe_timeout: Duration,
}

impl JsCssCollector {
    /// Sizes for `urls`, in order. Failed probes fall back to resource timing
    /// and are reported as degradation reasons.
    async fn sizes(
        &self,
        ctx: &dyn PageContext,
        urls: &[String],
        degraded: &mut Vec<String>,
    ) -> CollectionResult<Vec<u64>> {
        if !self.probe_sizes {
            return Ok(urls
                .iter()
                .map(|u| transfer_size(ctx.resources(), u))
                .collect());
        }

        let responses = probe::head_all(ctx, urls, self.probe_timeout).await;
        let mut sizes = Vec::with_capacity(urls.len());
        for (url, res) in urls.iter().zip(responses) {
            let size = match res {
                Ok(resp) => resp
                    .content_length()
                    .unwrap_or_else(|| transfer_size(ctx.resources(), url)),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    debug!(url = %url, error = %e, "size probe failed, using resource timing");
                    degraded.push(format!("size of {url} taken from resource timing: {e}"));
                    transfer_size(ctx.resources(), url)
                }
            };
            sizes.push(size);
        }
        Ok(sizes)
    }
}

fn transfer_size(resources: &[ResourceEntry], url: &str) -> u64 {
    resources
        .iter()
        .find(|r| r.name == url)
        .map(|r| r.transfer_size)
        .unwrap_or(0)
}

/// `.class` and `#id` tokens present in the document.
fn used_selectors(doc: &Document) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    for el in &doc.elements {
        used.extend(el.classes.iter().map(|c| format!(".{c}")));
        if let Some(id) = el.id.as_deref().filter(|id| !id.is_empty()) {
            used.insert(format!("#{id}"));
        }
    }
    used
}

#[async_trait]
impl Collector for JsCssCollector {
    type Raw = JsCssSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<JsCssSnapshot>> {
        let doc = ctx.document();
        let location = ctx.location();
        let mut degraded = Vec::new();

        let script_urls: Vec<String> = doc
            .external_scripts()
            .filter_map(|s| s.src.as_deref())
            .map(|src| location.absolute(src))
            .collect();
        let css_urls: Vec<String> = doc
            .stylesheet_links()
            .filter_map(|l| l.href.as_deref())
            .map(|href| location.absolute(href))
            .collect();

        let script_sizes = self.sizes(ctx, &script_urls, &mut degraded).await?;
        let css_sizes = self.sizes(ctx, &css_urls, &mut degraded).await?;

        let scripts: Vec<ScriptAsset> = doc
            .external_scripts()
            .zip(script_urls)
            .zip(script_sizes)
            .map(|((s, src), size_bytes)| ScriptAsset {
                src,
                render_blocking: s.is_render_blocking(),
                size_bytes,
            })
            .collect();

        let used = used_selectors(doc);
        let mut css_rule_count = 0;
        let mut unused_css_rule_count = 0;
        for sheet in &doc.style_sheets {
            match &sheet.rules {
                Some(rules) => {
                    css_rule_count += rules.len();
                    unused_css_rule_count += rules
                        .iter()
                        .filter(|rule| !used.iter().any(|sel| rule.contains(sel.as_str())))
                        .count();
                }
                None => degraded.push(format!(
                    "rules of stylesheet {} are not readable (cross-origin)",
                    sheet.href.as_deref().unwrap_or("<inline>")
                )),
            }
        }

        let snapshot = JsCssSnapshot {
            total_script_bytes: total_bytes(scripts.iter().map(|s| s.size_bytes)),
            scripts,
            inline_script_count: doc.inline_scripts().count(),
            inline_script_bytes: doc.inline_scripts().map(|s| s.text_length).sum(),
            stylesheet_count: css_urls.len(),
            total_css_bytes: total_bytes(css_sizes.iter().copied()),
            inline_style_count: doc.inline_styles.len(),
            inline_style_bytes: doc.inline_styles.iter().map(|s| s.text_length).sum(),
            css_rule_count,
            unused_css_rule_count,
            long_task_count: ctx.long_task_count(),
        };

        Ok(Collected::degraded(snapshot, degraded))
    }
}

pub struct JsCssScorer {
    config: JsCssConfig,
}

impl JsCssScorer {
    pub fn new(config: JsCssConfig) -> Self {
        Self { config }
    }
}

impl Scorer for JsCssScorer {
    type Raw = JsCssSnapshot;

    fn score(&self, raw: &JsCssSnapshot) -> ScoringResult<Vec<Finding>> {
        let cfg = &self.config;
        let mut findings = Vec::new();

        let blocking = raw.scripts.iter().filter(|s| s.render_blocking).count();
        if blocking > 0 {
            findings.push(
                Finding::warn(
                    "render-blocking-scripts",
                    format!("{blocking} render-blocking script(s); add defer or async"),
                )
                .with_metric("count", blocking),
            );
        }

        if raw.total_script_bytes > kb_to_bytes(cfg.threshold_kb) {
            findings.push(
                Finding::warn(
                    "large-js-payload",
                    format!(
                        "Total JS payload is {} KB; consider code splitting or tree shaking",
                        kb(raw.total_script_bytes)
                    ),
                )
                .with_metric("totalScriptBytes", raw.total_script_bytes),
            );
        }

        if raw.total_css_bytes > kb_to_bytes(cfg.css_threshold_kb) {
            findings.push(
                Finding::warn(
                    "large-css-payload",
                    format!(
                        "CSS payload is {} KB; remove unused styles or inline critical CSS",
                        kb(raw.total_css_bytes)
                    ),
                )
                .with_metric("totalCssBytes", raw.total_css_bytes),
            );
        }

        let large: Vec<&ScriptAsset> = raw
            .scripts
            .iter()
            .filter(|s| s.size_bytes > kb_to_bytes(cfg.script_file_threshold_kb))
            .collect();
        if !large.is_empty() {
            let largest = large.iter().map(|s| s.size_bytes).max().unwrap_or(0);
            findings.push(
                Finding::info(
                    "large-script-files",
                    format!(
                        "{} script file(s) exceed {} KB",
                        large.len(),
                        cfg.script_file_threshold_kb
                    ),
                )
                .with_metric("count", large.len())
                .with_metric("largestBytes", largest),
            );
        }

        if raw.inline_script_count > cfg.max_inline_scripts {
            findings.push(
                Finding::info(
                    "many-inline-scripts",
                    format!(
                        "{} inline scripts; move logic to cacheable files",
                        raw.inline_script_count
                    ),
                )
                .with_metric("count", raw.inline_script_count)
                .with_metric("bytes", raw.inline_script_bytes),
            );
        }

        if raw.inline_style_count > cfg.max_inline_styles {
            findings.push(
                Finding::info(
                    "many-inline-styles",
                    format!(
                        "{} inline style blocks; move them to external stylesheets",
                        raw.inline_style_count
                    ),
                )
                .with_metric("count", raw.inline_style_count)
                .with_metric("bytes", raw.inline_style_bytes),
            );
        }

        let dups = raw.duplicate_scripts();
        if !dups.is_empty() {
            findings.push(
                Finding::warn(
                    "duplicate-scripts",
                    format!("Duplicate script imports: {}", dups.join(", ")),
                )
                .with_metric("count", dups.len()),
            );
        }

        let unused = raw.unused_css_percent();
        if unused > cfg.unused_css_percent {
            findings.push(
                Finding::info(
                    "unused-css",
                    format!("About {unused}% of CSS rules appear unused"),
                )
                .with_metric("unusedPercent", unused)
                .with_metric("rules", raw.css_rule_count),
            );
        }

        if raw.long_task_count > 0 {
            findings.push(
                Finding::warn(
                    "long-tasks",
                    format!(
                        "{} long JS task(s); consider async work or web workers",
                        raw.long_task_count
                    ),
                )
                .with_metric("count", raw.long_task_count),
            );
        }

        Ok(findings)
    }
}

fn kb(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1000.0)
}

pub fn descriptor(config: &JsCssConfig, probe_timeout: Duration) -> ModuleDescriptor {
    ModuleDescriptor::new(
        JsCssCollector {
            probe_sizes: config.probe_sizes,
            probe_timeout,
        },
        JsCssScorer::new(config.clone()),
    )
    .with_title(TITLE)
}
