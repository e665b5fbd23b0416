//! Built-in registries executed end to end against an in-memory page.

use std::time::Duration;

use sitediag_checks::{core_registry, full_registry, ChecksConfig, CORE_MODULES};
use sitediag_core::fakes::FakeContext;
use sitediag_core::{
    Anchor, CollectionCause, Document, Element, Image, LinkTag, MetaTag, MetricValue,
    NavigationTiming, ReportStatus, ResourceEntry, Runner, RunnerConfig, Script,
    ServiceWorkerInfo, Severity,
};

fn meta_name(name: &str, content: &str) -> MetaTag {
    MetaTag {
        name: Some(name.into()),
        property: None,
        content: content.into(),
    }
}

fn meta_property(property: &str, content: &str) -> MetaTag {
    MetaTag {
        name: None,
        property: Some(property.into()),
        content: content.into(),
    }
}

fn async_script(src: &str) -> Script {
    Script {
        src: Some(src.into()),
        is_async: true,
        integrity: Some("sha384-xyz".into()),
        crossorigin: Some("anonymous".into()),
        ..Default::default()
    }
}

fn well_formed_page() -> Document {
    Document {
        title: Some("Example Store: handmade goods and gifts".into()),
        meta: vec![
            meta_name(
                "description",
                "Handmade goods, gifts and home decor from independent makers, shipped worldwide.",
            ),
            meta_name("twitter:card", "summary"),
            meta_property("og:title", "Example Store"),
            meta_property("og:description", "Handmade goods"),
        ],
        links: vec![
            LinkTag {
                rel: "canonical".into(),
                href: Some("https://shop.example.com/".into()),
                ..Default::default()
            },
            LinkTag {
                rel: "manifest".into(),
                href: Some("/manifest.json".into()),
                ..Default::default()
            },
        ],
        anchors: vec![Anchor {
            href: "https://shop.example.com/about".into(),
            ..Default::default()
        }],
        images: vec![Image {
            src: "/logo.png".into(),
            alt: Some("Example Store".into()),
        }],
        elements: vec![
            Element {
                tag: "h1".into(),
                ..Default::default()
            },
            Element {
                tag: "nav".into(),
                role: Some("navigation".into()),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

const SECURE_HEADERS: [(&str, &str); 8] = [
    ("content-security-policy", "default-src 'self'"),
    ("strict-transport-security", "max-age=63072000"),
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("referrer-policy", "strict-origin"),
    ("permissions-policy", "camera=()"),
    ("cross-origin-resource-policy", "same-origin"),
    ("cross-origin-opener-policy", "same-origin"),
];

fn healthy_context() -> FakeContext {
    FakeContext::new("https://shop.example.com/")
        .with_document(well_formed_page())
        .with_navigation_timing(NavigationTiming {
            navigation_start: 0.0,
            request_start: 10.0,
            response_start: 60.0,
            dom_content_loaded_event_end: 800.0,
            load_event_end: 1200.0,
        })
        .with_service_worker(ServiceWorkerInfo {
            supported: true,
            registrations: 1,
        })
        .with_probe("https://shop.example.com/", 200, &SECURE_HEADERS)
        .with_probe("https://shop.example.com", 200, &SECURE_HEADERS)
        .with_probe("https://shop.example.com/robots.txt", 200, &[])
        .with_probe("https://shop.example.com/sitemap.xml", 200, &[])
}

#[tokio::test]
async fn full_registry_on_healthy_page() {
    let registry = full_registry(&ChecksConfig::default()).unwrap();
    let runner = Runner::new(registry);

    let result = runner.run_all(&healthy_context()).await;

    assert_eq!(result.reports.len(), 10);
    for report in &result.reports {
        assert_ne!(report.status, ReportStatus::Failed, "{}", report.module_name);
    }
    assert_eq!(result.summary.count(Severity::Critical), 0);

    // Only the informational TLS note remains.
    let noisy: Vec<&str> = result
        .reports
        .iter()
        .filter(|r| !r.findings.is_empty())
        .map(|r| r.module_name.as_str())
        .collect();
    assert_eq!(noisy, vec!["dnsTls"]);
    assert_eq!(result.summary.total, 1);
}

#[tokio::test]
async fn core_registry_reports_in_registration_order() {
    let runner = Runner::with_config(
        core_registry(&ChecksConfig::default()).unwrap(),
        RunnerConfig { max_concurrent: 4 },
    );

    let result = runner.run_all(&FakeContext::new("https://example.com/")).await;

    let names: Vec<&str> = result.reports.iter().map(|r| r.module_name.as_str()).collect();
    assert_eq!(names, CORE_MODULES.to_vec());

    // Nothing answers probes: SEO degrades, the header audit fails.
    assert_eq!(result.report("seo").unwrap().status, ReportStatus::Partial);
    let security = result.report("security").unwrap();
    assert_eq!(security.status, ReportStatus::Failed);
    assert_eq!(
        security.error.as_ref().unwrap().cause,
        Some(CollectionCause::Network)
    );
    assert_eq!(result.report("dependencies").unwrap().status, ReportStatus::Ok);
}

#[tokio::test]
async fn js_payload_over_threshold_yields_one_warning() {
    let doc = Document {
        scripts: (0..4)
            .map(|i| async_script(&format!("https://example.com/chunk{i}.js")))
            .collect(),
        ..Default::default()
    };
    let mut ctx = FakeContext::new("https://example.com/").with_document(doc);
    for i in 0..4 {
        ctx = ctx.with_probe(
            &format!("https://example.com/chunk{i}.js"),
            200,
            &[("content-length", "300000")],
        );
    }

    let config: ChecksConfig = ChecksConfig::from_json(r#"{"jsCss": {"thresholdKB": 1000}}"#).unwrap();
    let runner = Runner::new(core_registry(&config).unwrap());

    let report = runner.run("jsCss", &ctx).await.unwrap();
    assert_eq!(report.status, ReportStatus::Ok);
    assert_eq!(report.findings.len(), 1);

    let finding = &report.findings[0];
    assert_eq!(finding.id(), "large-js-payload");
    assert_eq!(finding.severity(), Severity::Warn);
    assert_eq!(finding.metrics().len(), 1);
    assert_eq!(
        finding.metric("totalScriptBytes"),
        Some(&MetricValue::Int(1_200_000))
    );
}

#[tokio::test(start_paused = true)]
async fn slow_probe_times_out_security_module() {
    let ctx = FakeContext::new("https://example.com/")
        .with_probe("https://example.com/", 200, &[])
        .with_probe_delay(Duration::from_secs(30));
    let config = ChecksConfig::from_json(r#"{"probeTimeoutMs": 2000}"#).unwrap();
    let runner = Runner::new(core_registry(&config).unwrap());

    let report = runner.run("security", &ctx).await.unwrap();

    assert_eq!(report.status, ReportStatus::Failed);
    let error = report.error.unwrap();
    assert_eq!(error.cause, Some(CollectionCause::Timeout));
    assert!(error.message.contains("2000ms"));
}

#[tokio::test]
async fn third_party_heavy_page() {
    let resources = (0..10)
        .map(|i| ResourceEntry {
            name: format!("https://t{i}.analytics.example.net/collect.js"),
            initiator_type: "script".into(),
            transfer_size: 1_000 * (i + 1),
            duration: 30.0,
        })
        .collect();
    let ctx = FakeContext::new("https://example.com/").with_resources(resources);
    let runner = Runner::new(core_registry(&ChecksConfig::default()).unwrap());

    let report = runner.run("dependencies", &ctx).await.unwrap();

    assert_eq!(report.count(Severity::Warn), 10);
    assert_eq!(report.worst_severity(), Some(Severity::Critical));
    assert_eq!(
        report.findings[0].metric("domain"),
        Some(&MetricValue::Text("t9.analytics.example.net".into()))
    );
}
