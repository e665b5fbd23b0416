//! Service worker & PWA readiness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer, ServiceWorkerInfo,
};

pub const NAME: &str = "pwa";
pub const TITLE: &str = "Service Worker & PWA Readiness";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PwaConfig {
    /// Hosts treated as secure contexts over plain HTTP.
    pub trusted_hosts: Vec<String>,
}

impl Default for PwaConfig {
    fn default() -> Self {
        Self {
            trusted_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PwaSnapshot {
    /// `None` when the environment cannot report service worker state.
    pub service_worker: Option<ServiceWorkerInfo>,
    pub manifest_href: Option<String>,
    pub https: bool,
    pub hostname: String,
}

pub struct PwaCollector;

#[async_trait]
impl Collector for PwaCollector {
    type Raw = PwaSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<PwaSnapshot>> {
        let location = ctx.location();
        let service_worker = ctx.service_worker();
        let degraded = if service_worker.is_none() {
            vec!["service worker state is not observable".to_string()]
        } else {
            Vec::new()
        };

        Ok(Collected::degraded(
            PwaSnapshot {
                service_worker,
                manifest_href: ctx
                    .document()
                    .link_with_rel("manifest")
                    .and_then(|l| l.href.clone()),
                https: location.is_https(),
                hostname: location.hostname.clone(),
            },
            degraded,
        ))
    }
}

pub struct PwaScorer {
    config: PwaConfig,
}

impl Scorer for PwaScorer {
    type Raw = PwaSnapshot;

    fn score(&self, raw: &PwaSnapshot) -> ScoringResult<Vec<Finding>> {
        let mut findings = Vec::new();

        if let Some(sw) = raw.service_worker {
            if !sw.supported || sw.registrations == 0 {
                findings.push(
                    Finding::warn(
                        "no-service-worker",
                        "No service worker registered; offline caching is unavailable",
                    )
                    .with_metric("supported", if sw.supported { "yes" } else { "no" })
                    .with_metric("registrations", sw.registrations),
                );
            }
        }

        if raw.manifest_href.is_none() {
            findings.push(Finding::warn(
                "missing-manifest",
                "Add a web app manifest for installability",
            ));
        }

        let trusted = self
            .config
            .trusted_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(&raw.hostname));
        if !raw.https && !trusted {
            findings.push(
                Finding::critical(
                    "insecure-origin",
                    "Page is not served over HTTPS; service workers require a secure context",
                )
                .with_metric("hostname", raw.hostname.as_str()),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &PwaConfig) -> ModuleDescriptor {
    ModuleDescriptor::new(
        PwaCollector,
        PwaScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediag_core::fakes::FakeContext;
    use sitediag_core::{Document, LinkTag, Severity};

    fn scorer() -> PwaScorer {
        PwaScorer {
            config: PwaConfig::default(),
        }
    }

    fn ready() -> PwaSnapshot {
        PwaSnapshot {
            service_worker: Some(ServiceWorkerInfo {
                supported: true,
                registrations: 1,
            }),
            manifest_href: Some("/manifest.webmanifest".into()),
            https: true,
            hostname: "example.com".into(),
        }
    }

    #[test]
    fn test_installable_page_is_clean() {
        assert!(scorer().score(&ready()).unwrap().is_empty());
    }

    #[test]
    fn test_insecure_page_without_worker() {
        let raw = PwaSnapshot {
            service_worker: Some(ServiceWorkerInfo {
                supported: true,
                registrations: 0,
            }),
            manifest_href: None,
            https: false,
            hostname: "example.com".into(),
        };
        let findings = scorer().score(&raw).unwrap();

        let ids: Vec<&str> = findings.iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec!["no-service-worker", "missing-manifest", "insecure-origin"]);
        assert_eq!(findings[2].severity(), Severity::Critical);
    }

    #[test]
    fn test_localhost_is_secure_context() {
        let raw = PwaSnapshot {
            https: false,
            hostname: "localhost".into(),
            ..ready()
        };
        assert!(scorer().score(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_worker_state_is_not_reported() {
        let raw = PwaSnapshot {
            service_worker: None,
            ..ready()
        };
        assert!(scorer().score(&raw).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collect_manifest_and_worker() {
        let doc = Document {
            links: vec![LinkTag {
                rel: "manifest".into(),
                href: Some("https://example.com/app.webmanifest".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let ctx = FakeContext::new("http://example.com/")
            .with_document(doc)
            .with_service_worker(ServiceWorkerInfo {
                supported: true,
                registrations: 2,
            });

        let collected = PwaCollector.collect(&ctx).await.unwrap();
        assert!(!collected.is_degraded());
        assert!(!collected.data.https);
        assert_eq!(
            collected.data.manifest_href.as_deref(),
            Some("https://example.com/app.webmanifest")
        );
    }

    #[tokio::test]
    async fn test_unobservable_worker_degrades() {
        let ctx = FakeContext::new("https://example.com/");
        let collected = PwaCollector.collect(&ctx).await.unwrap();
        assert!(collected.is_degraded());
    }
}
