//! DNS & TLS strength overview.
//!
//! Only what a page can observe is checked: the protocol, the round trip of
//! a HEAD request to the origin and the HSTS header on that response. TLS
//! version and DNSSEC are out of reach and reported as such.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    probe, Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer,
};

pub const NAME: &str = "dnsTls";
pub const TITLE: &str = "DNS & TLS Strength Overview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DnsTlsConfig {
    pub latency_ms: f64,
}

impl Default for DnsTlsConfig {
    fn default() -> Self {
        Self { latency_ms: 500.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsTlsSnapshot {
    pub hostname: String,
    pub https: bool,
    /// `None` when the origin could not be probed.
    pub round_trip: Option<Duration>,
    pub hsts: Option<String>,
}

pub struct DnsTlsCollector {
    probe_timeout: Duration,
}

#[async_trait]
impl Collector for DnsTlsCollector {
    type Raw = DnsTlsSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<DnsTlsSnapshot>> {
        let location = ctx.location();
        let mut snapshot = DnsTlsSnapshot {
            hostname: location.hostname.clone(),
            https: location.is_https(),
            ..Default::default()
        };

        match probe::head(ctx, &location.origin, self.probe_timeout).await {
            Ok(resp) => {
                snapshot.round_trip = Some(resp.elapsed);
                snapshot.hsts = resp.header("strict-transport-security").map(str::to_string);
                Ok(Collected::complete(snapshot))
            }
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => Ok(Collected::degraded(
                snapshot,
                vec![format!("could not measure latency to {}: {e}", location.origin)],
            )),
        }
    }
}

pub struct DnsTlsScorer {
    config: DnsTlsConfig,
}

impl Scorer for DnsTlsScorer {
    type Raw = DnsTlsSnapshot;

    fn score(&self, raw: &DnsTlsSnapshot) -> ScoringResult<Vec<Finding>> {
        let mut findings = Vec::new();

        if !raw.https {
            findings.push(
                Finding::critical("https-disabled", "Page is served over plain HTTP")
                    .with_metric("hostname", raw.hostname.as_str()),
            );
        } else if raw.round_trip.is_some() && raw.hsts.is_none() {
            findings.push(Finding::warn(
                "missing-hsts",
                "No Strict-Transport-Security header on the origin",
            ));
        }

        if let Some(rtt) = raw.round_trip {
            let ms = rtt.as_secs_f64() * 1000.0;
            if ms > self.config.latency_ms {
                findings.push(
                    Finding::warn(
                        "high-latency",
                        format!("Network round trip to the origin took {ms:.1} ms"),
                    )
                    .with_metric("roundTripMs", (ms * 10.0).round() / 10.0),
                );
            }
        }

        findings.push(
            Finding::info(
                "tls-not-inspectable",
                "TLS version and DNSSEC cannot be verified from the page; use an external scanner",
            )
            .with_metric("hostname", raw.hostname.as_str()),
        );

        Ok(findings)
    }
}

pub fn descriptor(config: &DnsTlsConfig, probe_timeout: Duration) -> ModuleDescriptor {
    ModuleDescriptor::new(
        DnsTlsCollector { probe_timeout },
        DnsTlsScorer {
            config: config.clone(),
        },
    )
    .with_title(TITLE)
}
