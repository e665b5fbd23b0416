//! The environment collaborator.
//!
//! Collectors never touch a host API directly. Everything they may observe
//! is exposed through [`PageContext`]: the document, resource timing,
//! storage, cookies, and outbound HEAD probes. Implementations decide where
//! those facts come from (a captured snapshot, a live browser bridge, a test
//! fake).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cancel::CancellationToken;
use crate::document::Document;
use crate::error::{CollectionError, CollectionResult};

/// `window.location` equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub href: String,
    pub origin: String,
    pub hostname: String,
    /// Scheme with trailing colon, e.g. `https:`.
    pub protocol: String,
}

impl Location {
    /// Parse an absolute page URL.
    pub fn parse(href: &str) -> CollectionResult<Self> {
        let url = Url::parse(href)
            .map_err(|e| CollectionError::parse(format!("invalid page URL {href}: {e}")))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| CollectionError::parse(format!("page URL has no host: {href}")))?
            .to_string();

        Ok(Self {
            href: url.to_string(),
            origin: url.origin().ascii_serialization(),
            hostname,
            protocol: format!("{}:", url.scheme()),
        })
    }

    pub fn is_https(&self) -> bool {
        self.protocol == "https:"
    }

    /// Resolve a path against the origin, e.g. `/robots.txt`.
    pub fn origin_url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    /// `href` resolved against the page URL, as the DOM's `.href` and `.src`
    /// properties report it. Relative, root-relative and protocol-relative
    /// references all come back absolute.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        Url::parse(&self.href).ok()?.join(href.trim()).ok()
    }

    /// Like [`resolve`](Self::resolve), keeping `href` as written when it
    /// cannot be resolved.
    pub fn absolute(&self, href: &str) -> String {
        self.resolve(href)
            .map(String::from)
            .unwrap_or_else(|| href.to_string())
    }

    /// Scheme, host and port all match the page.
    pub fn is_same_origin(&self, href: &str) -> bool {
        self.resolve(href)
            .is_some_and(|url| url.origin().ascii_serialization() == self.origin)
    }

    /// The resolved host equals the page hostname. References without a host
    /// (`mailto:`, `javascript:`) never match.
    pub fn is_same_host(&self, href: &str) -> bool {
        self.resolve(href)
            .is_some_and(|url| url.host_str() == Some(self.hostname.as_str()))
    }
}

/// A `PerformanceResourceTiming` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceEntry {
    /// Resource URL.
    pub name: String,
    pub initiator_type: String,
    pub transfer_size: u64,
    /// Milliseconds.
    pub duration: f64,
}

impl ResourceEntry {
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.name)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

/// Navigation timing marks, in milliseconds since the time origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationTiming {
    pub navigation_start: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_end: f64,
}

impl NavigationTiming {
    pub fn ttfb_ms(&self) -> f64 {
        self.response_start - self.request_start
    }

    pub fn dom_load_ms(&self) -> f64 {
        self.dom_content_loaded_event_end - self.navigation_start
    }

    pub fn total_load_ms(&self) -> f64 {
        self.load_event_end - self.navigation_start
    }

    /// `loadEventEnd` stays zero until the load event has finished.
    pub fn is_complete(&self) -> bool {
        self.load_event_end > 0.0
    }
}

/// A `localStorage` / `sessionStorage` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageEntry {
    pub key: String,
    pub value: String,
}

/// Service worker support as reported by `navigator.serviceWorker`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceWorkerInfo {
    pub supported: bool,
    pub registrations: u32,
}

/// Response to a HEAD probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub status: u16,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Read-only view of the page under audit.
///
/// Implementations must be cheap to share: the runner hands the same
/// reference to every collector of a batch.
#[async_trait]
pub trait PageContext: Send + Sync {
    fn location(&self) -> &Location;

    fn document(&self) -> &Document;

    fn resources(&self) -> &[ResourceEntry];

    fn navigation_timing(&self) -> Option<&NavigationTiming>;

    fn long_task_count(&self) -> usize;

    /// `document.cookie`.
    fn cookie_string(&self) -> &str;

    fn local_storage(&self) -> &[StorageEntry];

    fn session_storage(&self) -> &[StorageEntry];

    /// `None` when the environment cannot tell.
    fn service_worker(&self) -> Option<ServiceWorkerInfo>;

    /// Issue a single HEAD request. Unbounded; collectors go through
    /// [`crate::probe::head`], which applies the timeout and cancellation.
    async fn fetch_head(&self, url: &str) -> CollectionResult<ProbeResponse>;

    fn cancellation(&self) -> &CancellationToken;
}
