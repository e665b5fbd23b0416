//! SEO & link health audit.
//!
//! Collects head metadata, link and image statistics from the document and
//! probes `/robots.txt` and `/sitemap.xml` on the page origin.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    probe, Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ProbeResponse, ScoringResult, Scorer,
};

pub const NAME: &str = "seo";
pub const TITLE: &str = "SEO & Link Health Audit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeoConfig {
    pub title_min_chars: usize,
    pub title_max_chars: usize,
    pub description_min_chars: usize,
    pub description_max_chars: usize,
    /// External links above which at least one `nofollow` is expected.
    pub external_link_limit: usize,
    /// Probe `/robots.txt` and `/sitemap.xml`.
    pub check_crawler_files: bool,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            title_min_chars: 30,
            title_max_chars: 65,
            description_min_chars: 70,
            description_max_chars: 160,
            external_link_limit: 50,
            check_crawler_files: true,
        }
    }
}

/// Outcome of a crawler-file probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileStatus {
    Accessible,
    /// Reached, but with a non-2xx status.
    Status(u16),
    Unreachable(String),
    #[default]
    NotChecked,
}

impl FileStatus {
    fn from_probe(res: CollectionResult<ProbeResponse>) -> CollectionResult<Self> {
        match res {
            Ok(resp) if resp.is_success() => Ok(FileStatus::Accessible),
            Ok(resp) => Ok(FileStatus::Status(resp.status)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => Ok(FileStatus::Unreachable(e.to_string())),
        }
    }

    fn is_available(&self) -> bool {
        matches!(self, FileStatus::Accessible | FileStatus::NotChecked)
    }

    fn describe(&self) -> String {
        match self {
            FileStatus::Accessible => "accessible".to_string(),
            FileStatus::Status(code) => format!("HTTP {code}"),
            FileStatus::Unreachable(_) => "not reachable".to_string(),
            FileStatus::NotChecked => "not checked".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeoSnapshot {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub twitter_card: Option<String>,
    pub total_links: usize,
    pub external_links: usize,
    pub nofollow_links: usize,
    pub images: usize,
    pub images_missing_alt: usize,
    pub robots_txt: FileStatus,
    pub sitemap_xml: FileStatus,
}

pub struct SeoCollector {
    check_crawler_files: bool,
    probe_timeout: Duration,
}

#[async_trait]
impl Collector for SeoCollector {
    type Raw = SeoSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<SeoSnapshot>> {
        let doc = ctx.document();
        let location = ctx.location();

        let links: Vec<_> = doc.anchors.iter().filter(|a| !a.href.is_empty()).collect();
        let external_links = links
            .iter()
            .filter(|a| !location.is_same_host(&a.href))
            .count();

        let mut snapshot = SeoSnapshot {
            title: doc.title().map(str::to_string),
            meta_description: doc.meta_named("description").map(str::to_string),
            canonical: doc
                .link_with_rel("canonical")
                .and_then(|l| l.href.clone()),
            og_title: doc.meta_property("og:title").map(str::to_string),
            og_description: doc.meta_property("og:description").map(str::to_string),
            twitter_card: doc.meta_named("twitter:card").map(str::to_string),
            total_links: links.len(),
            external_links,
            nofollow_links: links.iter().filter(|a| a.is_nofollow()).count(),
            images: doc.images.len(),
            images_missing_alt: doc.images.iter().filter(|i| i.lacks_alt()).count(),
            ..Default::default()
        };

        if !self.check_crawler_files {
            return Ok(Collected::complete(snapshot));
        }

        let robots_url = location.origin_url("/robots.txt");
        let sitemap_url = location.origin_url("/sitemap.xml");
        let (robots, sitemap) = join(
            probe::head(ctx, &robots_url, self.probe_timeout),
            probe::head(ctx, &sitemap_url, self.probe_timeout),
        )
        .await;

        snapshot.robots_txt = FileStatus::from_probe(robots)?;
        snapshot.sitemap_xml = FileStatus::from_probe(sitemap)?;

        let mut degraded = Vec::new();
        for (url, status) in [
            (&robots_url, &snapshot.robots_txt),
            (&sitemap_url, &snapshot.sitemap_xml),
        ] {
            if let FileStatus::Unreachable(reason) = status {
                degraded.push(format!("probe of {url} failed: {reason}"));
            }
        }

        Ok(Collected::degraded(snapshot, degraded))
    }
}

pub struct SeoScorer {
    config: SeoConfig,
}

impl Scorer for SeoScorer {
    type Raw = SeoSnapshot;

    fn score(&self, raw: &SeoSnapshot) -> ScoringResult<Vec<Finding>> {
        let cfg = &self.config;
        let mut findings = Vec::new();

        match raw.title.as_deref() {
            None => findings.push(Finding::critical("missing-title", "Page has no <title>")),
            Some(title) => {
                let len = title.chars().count();
                if len < cfg.title_min_chars || len > cfg.title_max_chars {
                    findings.push(
                        Finding::warn(
                            "title-length",
                            format!(
                                "Title is {len} chars; keep it between {} and {}",
                                cfg.title_min_chars, cfg.title_max_chars
                            ),
                        )
                        .with_metric("titleLength", len),
                    );
                }
            }
        }

        match raw.meta_description.as_deref() {
            None => findings.push(Finding::warn(
                "missing-meta-description",
                "Add a concise meta description",
            )),
            Some(desc) => {
                let len = desc.chars().count();
                if len < cfg.description_min_chars || len > cfg.description_max_chars {
                    findings.push(
                        Finding::warn(
                            "meta-description-length",
                            format!(
                                "Meta description is {len} chars; keep it between {} and {}",
                                cfg.description_min_chars, cfg.description_max_chars
                            ),
                        )
                        .with_metric("descriptionLength", len),
                    );
                }
            }
        }

        if raw.canonical.is_none() {
            findings.push(Finding::warn(
                "missing-canonical",
                "Add a canonical URL to prevent duplicate content issues",
            ));
        }

        if raw.og_title.is_none() || raw.og_description.is_none() {
            findings.push(Finding::info(
                "missing-open-graph",
                "Add og:title and og:description for richer social sharing",
            ));
        }

        if raw.twitter_card.is_none() {
            findings.push(Finding::info(
                "missing-twitter-card",
                "Add a twitter:card meta tag for social previews",
            ));
        }

        if raw.external_links > cfg.external_link_limit && raw.nofollow_links == 0 {
            findings.push(
                Finding::info(
                    "external-links-without-nofollow",
                    "Consider nofollow for untrusted or affiliate external links",
                )
                .with_metric("externalLinks", raw.external_links)
                .with_metric("totalLinks", raw.total_links),
            );
        }

        if raw.images_missing_alt > 0 {
            findings.push(
                Finding::warn(
                    "images-missing-alt",
                    format!("{} image(s) have no alt text", raw.images_missing_alt),
                )
                .with_metric("imagesMissingAlt", raw.images_missing_alt)
                .with_metric("images", raw.images),
            );
        }

        if !raw.robots_txt.is_available() {
            findings.push(
                Finding::warn(
                    "robots-txt-unavailable",
                    "robots.txt is missing or inaccessible; add one to guide crawlers",
                )
                .with_metric("status", raw.robots_txt.describe()),
            );
        }

        if !raw.sitemap_xml.is_available() {
            findings.push(
                Finding::warn(
                    "sitemap-unavailable",
                    "sitemap.xml is missing or inaccessible; add one for better indexing",
                )
                .with_metric("status", raw.sitemap_xml.describe()),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &SeoConfig, probe_timeout: Duration) -> ModuleDescriptor {
    ModuleDescriptor::new(
        SeoCollector {
            check_crawler_files: config.check_crawler_files,
            probe_timeout,
        },
        SeoScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediag_core::fakes::FakeContext;
    use sitediag_core::{
        Anchor, CollectionCause, CollectionError, Document, Image, LinkTag, MetaTag, Severity,
    };

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.id()).collect()
    }

    fn complete_snapshot() -> SeoSnapshot {
        SeoSnapshot {
            title: Some("A reasonably sized page title for tests".into()),
            meta_description: Some("x".repeat(120)),
            canonical: Some("https://example.com/".into()),
            og_title: Some("Title".into()),
            og_description: Some("Description".into()),
            twitter_card: Some("summary".into()),
            total_links: 3,
            external_links: 1,
            nofollow_links: 0,
            images: 2,
            images_missing_alt: 0,
            robots_txt: FileStatus::Accessible,
            sitemap_xml: FileStatus::Accessible,
        }
    }

    fn scorer() -> SeoScorer {
        SeoScorer {
            config: SeoConfig::default(),
        }
    }

    #[test]
    fn test_clean_page_has_no_findings() {
        assert!(scorer().score(&complete_snapshot()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_snapshot_flags_metadata_in_order() {
        let findings = scorer().score(&SeoSnapshot::default()).unwrap();
        assert_eq!(
            ids(&findings),
            vec![
                "missing-title",
                "missing-meta-description",
                "missing-canonical",
                "missing-open-graph",
                "missing-twitter-card",
            ]
        );
        assert_eq!(findings[0].severity(), Severity::Critical);
    }

    #[test]
    fn test_length_bounds() {
        let mut raw = complete_snapshot();
        raw.title = Some("Short".into());
        raw.meta_description = Some("y".repeat(161));

        let findings = scorer().score(&raw).unwrap();
        assert_eq!(ids(&findings), vec!["title-length", "meta-description-length"]);
        assert_eq!(
            findings[1].metric("descriptionLength"),
            Some(&sitediag_core::MetricValue::Int(161))
        );
    }

    #[test]
    fn test_nofollow_only_above_limit() {
        let mut raw = complete_snapshot();
        raw.external_links = 50;
        assert!(scorer().score(&raw).unwrap().is_empty());

        raw.external_links = 51;
        let findings = scorer().score(&raw).unwrap();
        assert_eq!(ids(&findings), vec!["external-links-without-nofollow"]);

        raw.nofollow_links = 1;
        assert!(scorer().score(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_crawler_file_statuses() {
        let mut raw = complete_snapshot();
        raw.robots_txt = FileStatus::Status(404);
        raw.sitemap_xml = FileStatus::Unreachable("connection refused".into());

        let findings = scorer().score(&raw).unwrap();
        assert_eq!(ids(&findings), vec!["robots-txt-unavailable", "sitemap-unavailable"]);
        assert_eq!(findings[0].metric("status").unwrap().to_string(), "HTTP 404");
    }

    fn page() -> Document {
        Document {
            title: Some("Example Domain".into()),
            meta: vec![MetaTag {
                name: Some("description".into()),
                property: None,
                content: "An example".into(),
            }],
            links: vec![LinkTag {
                rel: "canonical".into(),
                href: Some("https://example.com/".into()),
                ..Default::default()
            }],
            anchors: vec![
                Anchor {
                    href: "https://example.com/about".into(),
                    ..Default::default()
                },
                Anchor {
                    href: "https://other.org/".into(),
                    rel: "nofollow noopener".into(),
                    ..Default::default()
                },
                Anchor::default(),
            ],
            images: vec![
                Image {
                    src: "a.png".into(),
                    alt: Some("logo".into()),
                },
                Image {
                    src: "b.png".into(),
                    alt: None,
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_collect_counts_links_and_probes() {
        let ctx = FakeContext::new("https://example.com/page")
            .with_document(page())
            .with_probe("https://example.com/robots.txt", 200, &[])
            .with_probe("https://example.com/sitemap.xml", 404, &[]);

        let collector = SeoCollector {
            check_crawler_files: true,
            probe_timeout: Duration::from_secs(1),
        };
        let collected = collector.collect(&ctx).await.unwrap();
        let raw = collected.data;

        assert!(collected.degraded.is_empty());
        assert_eq!(raw.total_links, 2);
        assert_eq!(raw.external_links, 1);
        assert_eq!(raw.nofollow_links, 1);
        assert_eq!(raw.images_missing_alt, 1);
        assert_eq!(raw.canonical.as_deref(), Some("https://example.com/"));
        assert_eq!(raw.robots_txt, FileStatus::Accessible);
        assert_eq!(raw.sitemap_xml, FileStatus::Status(404));
        assert_eq!(ctx.probe_calls(), 2);
    }

    #[tokio::test]
    async fn test_relative_links_are_internal() {
        let mut anchors: Vec<Anchor> = (0..60)
            .map(|i| Anchor {
                href: format!("/page/{i}"),
                ..Default::default()
            })
            .collect();
        anchors.push(Anchor {
            href: "//partner.example.net/deal".into(),
            ..Default::default()
        });
        anchors.push(Anchor {
            href: "../up".into(),
            ..Default::default()
        });
        let ctx = FakeContext::new("https://example.com/blog/post").with_document(Document {
            anchors,
            ..Default::default()
        });

        let collector = SeoCollector {
            check_crawler_files: false,
            probe_timeout: Duration::from_secs(1),
        };
        let raw = collector.collect(&ctx).await.unwrap().data;

        assert_eq!(raw.total_links, 62);
        assert_eq!(raw.external_links, 1);
        let findings = scorer().score(&raw).unwrap();
        assert!(!ids(&findings).contains(&"external-links-without-nofollow"));
    }

    #[tokio::test]
    async fn test_unreachable_probe_degrades_snapshot() {
        let ctx = FakeContext::new("https://example.com/")
            .with_probe("https://example.com/robots.txt", 200, &[]);

        let collector = SeoCollector {
            check_crawler_files: true,
            probe_timeout: Duration::from_secs(1),
        };
        let collected = collector.collect(&ctx).await.unwrap();

        assert_eq!(collected.degraded.len(), 1);
        assert!(collected.degraded[0].contains("sitemap.xml"));
        assert!(matches!(collected.data.sitemap_xml, FileStatus::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_cancelled_probe_propagates() {
        let ctx = FakeContext::new("https://example.com/")
            .with_probe_error("https://example.com/robots.txt", CollectionError::cancelled())
            .with_probe("https://example.com/sitemap.xml", 200, &[]);

        let collector = SeoCollector {
            check_crawler_files: true,
            probe_timeout: Duration::from_secs(1),
        };
        let err = collector.collect(&ctx).await.unwrap_err();
        assert_eq!(err.cause, CollectionCause::Cancelled);
    }

    #[tokio::test]
    async fn test_crawler_checks_can_be_disabled() {
        let ctx = FakeContext::new("https://example.com/").with_document(page());
        let collector = SeoCollector {
            check_crawler_files: false,
            probe_timeout: Duration::from_secs(1),
        };

        let collected = collector.collect(&ctx).await.unwrap();
        assert_eq!(collected.data.robots_txt, FileStatus::NotChecked);
        assert_eq!(ctx.probe_calls(), 0);
    }

    #[test]
    fn test_config_defaults_and_overrides() {
        let cfg: SeoConfig = serde_json::from_str(r#"{"titleMaxChars": 70}"#).unwrap();
        assert_eq!(cfg.title_max_chars, 70);
        assert_eq!(cfg.title_min_chars, 30);
        assert!(cfg.check_crawler_files);
    }
}
