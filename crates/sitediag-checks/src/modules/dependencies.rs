//! Third-party & dependency risk report.
//!
//! Resource timing entries are grouped by hostname. Each domain is then put
//! in a category by substring match against configurable pattern lists,
//! checked in a fixed order (analytics, advertising, social, CDN, API), with
//! a first-party check last.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer,
};

use super::total_bytes;

pub const NAME: &str = "dependencies";
pub const TITLE: &str = "Third-Party & Dependency Risk Report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependenciesConfig {
    /// High-risk domain count at which `high-risk-dependencies` fires.
    pub high_risk_limit: usize,
    pub analytics_patterns: Vec<String>,
    pub advertising_patterns: Vec<String>,
    pub social_patterns: Vec<String>,
    pub cdn_patterns: Vec<String>,
    pub api_patterns: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            high_risk_limit: 10,
            analytics_patterns: strings(&["googletagmanager", "analytics"]),
            advertising_patterns: strings(&["doubleclick", "adservice", "ads"]),
            social_patterns: strings(&["facebook", "tiktok", "twitter", "linkedin"]),
            cdn_patterns: strings(&["font", "cdn", "gstatic", "cloudflare"]),
            api_patterns: strings(&["api", "auth", "maps"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Analytics,
    Advertising,
    Social,
    Cdn,
    Api,
    FirstParty,
    Unclassified,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Analytics => "Analytics / Tracking",
            Category::Advertising => "Advertising / AdTech",
            Category::Social => "Social Media Integration",
            Category::Cdn => "Asset CDN / Font Hosting",
            Category::Api => "External API / Auth Service",
            Category::FirstParty => "First-Party",
            Category::Unclassified => "Unclassified",
        }
    }

    pub fn risk(&self) -> Risk {
        match self {
            Category::Analytics | Category::Advertising => Risk::High,
            Category::Api | Category::Social => Risk::Medium,
            _ => Risk::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Risk {
    Low,
    Medium,
    High,
}

/// Resource usage of one hostname.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainUsage {
    pub domain: String,
    pub requests: usize,
    pub transfer_bytes: u64,
    pub avg_duration_ms: f64,
    /// Distinct initiator types, sorted.
    pub initiator_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DependencySnapshot {
    pub page_hostname: String,
    /// Sorted by domain.
    pub domains: Vec<DomainUsage>,
}

pub struct DependenciesCollector;

#[async_trait]
impl Collector for DependenciesCollector {
    type Raw = DependencySnapshot;

    async fn collect(
        &self,
        ctx: &dyn PageContext,
    ) -> CollectionResult<Collected<DependencySnapshot>> {
        let mut grouped: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for entry in ctx.resources() {
            // Entries without a parseable URL (data:, blob:) are skipped.
            if let Some(host) = entry.hostname() {
                grouped.entry(host).or_default().push(entry);
            }
        }

        let domains = grouped
            .into_iter()
            .map(|(domain, entries)| {
                let mut types: Vec<String> =
                    entries.iter().map(|e| e.initiator_type.clone()).collect();
                types.sort();
                types.dedup();
                DomainUsage {
                    domain,
                    requests: entries.len(),
                    transfer_bytes: total_bytes(entries.iter().map(|e| e.transfer_size)),
                    avg_duration_ms: entries.iter().map(|e| e.duration).sum::<f64>()
                        / entries.len() as f64,
                    initiator_types: types,
                }
            })
            .collect();

        Ok(Collected::complete(DependencySnapshot {
            page_hostname: ctx.location().hostname.clone(),
            domains,
        }))
    }
}

pub struct DependenciesScorer {
    config: DependenciesConfig,
}

impl DependenciesScorer {
    pub fn new(config: DependenciesConfig) -> Self {
        Self { config }
    }

    pub fn categorize(&self, domain: &str, page_hostname: &str) -> Category {
        let d = domain.to_lowercase();
        let matches = |patterns: &[String]| patterns.iter().any(|p| d.contains(p.as_str()));
        let cfg = &self.config;

        if matches(&cfg.analytics_patterns) {
            Category::Analytics
        } else if matches(&cfg.advertising_patterns) {
            Category::Advertising
        } else if matches(&cfg.social_patterns) {
            Category::Social
        } else if matches(&cfg.cdn_patterns) {
            Category::Cdn
        } else if matches(&cfg.api_patterns) {
            Category::Api
        } else if !page_hostname.is_empty() && d.contains(&page_hostname.to_lowercase()) {
            Category::FirstParty
        } else {
            Category::Unclassified
        }
    }
}

fn domain_finding(id: &str, usage: &DomainUsage, category: Category, risk: Risk) -> Finding {
    let message = format!(
        "{} ({}) serves {} request(s), {:.1} KB",
        usage.domain,
        category.label(),
        usage.requests,
        usage.transfer_bytes as f64 / 1000.0
    );
    let finding = match risk {
        Risk::High => Finding::warn(id, message),
        _ => Finding::info(id, message),
    };
    finding
        .with_metric("domain", usage.domain.as_str())
        .with_metric("category", category.label())
        .with_metric("requests", usage.requests)
        .with_metric("transferBytes", usage.transfer_bytes)
        .with_metric("avgLatencyMs", (usage.avg_duration_ms * 100.0).round() / 100.0)
        .with_metric("types", usage.initiator_types.join(", "))
}

impl Scorer for DependenciesScorer {
    type Raw = DependencySnapshot;

    fn score(&self, raw: &DependencySnapshot) -> ScoringResult<Vec<Finding>> {
        let mut third_party: Vec<(&DomainUsage, Category)> = Vec::new();
        let mut first_party = 0usize;
        for usage in &raw.domains {
            match self.categorize(&usage.domain, &raw.page_hostname) {
                Category::FirstParty => first_party += 1,
                category => third_party.push((usage, category)),
            }
        }
        third_party.sort_by(|(a, _), (b, _)| {
            b.transfer_bytes
                .cmp(&a.transfer_bytes)
                .then_with(|| a.domain.cmp(&b.domain))
        });

        let mut findings = Vec::new();
        let mut high = 0usize;
        let mut medium = 0usize;
        for (usage, category) in &third_party {
            match category.risk() {
                Risk::High => {
                    high += 1;
                    findings.push(domain_finding("high-risk-dependency", usage, *category, Risk::High));
                }
                Risk::Medium => {
                    medium += 1;
                    findings.push(domain_finding(
                        "medium-risk-dependency",
                        usage,
                        *category,
                        Risk::Medium,
                    ));
                }
                Risk::Low => {}
            }
        }

        if !third_party.is_empty() {
            let third_party_bytes = total_bytes(third_party.iter().map(|(u, _)| u.transfer_bytes));
            findings.push(
                Finding::info(
                    "third-party-footprint",
                    format!(
                        "{} third-party domain(s) deliver {:.1} KB",
                        third_party.len(),
                        third_party_bytes as f64 / 1000.0
                    ),
                )
                .with_metric("totalDomains", raw.domains.len())
                .with_metric("thirdPartyDomains", third_party.len())
                .with_metric("firstPartyDomains", first_party)
                .with_metric("thirdPartyBytes", third_party_bytes)
                .with_metric("highRisk", high)
                .with_metric("mediumRisk", medium),
            );
        }

        if high >= self.config.high_risk_limit {
            findings.push(
                Finding::critical(
                    "high-risk-dependencies",
                    format!(
                        "{high} analytics/advertising domains; review them for data leakage and consent compliance"
                    ),
                )
                .with_metric("highRisk", high)
                .with_metric("limit", self.config.high_risk_limit),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &DependenciesConfig) -> ModuleDescriptor {
    ModuleDescriptor::new(DependenciesCollector, DependenciesScorer::new(config.clone()))
        .with_title(TITLE)
}
