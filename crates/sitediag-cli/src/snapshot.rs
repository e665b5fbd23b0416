//! Captured page snapshots and the [`PageContext`] built on them.
//!
//! A snapshot is a JSON dump of what a browser-side exporter could see:
//!
//! ```json
//! {
//!   "url": "https://example.com/",
//!   "document": { "title": "Example", "scripts": [{ "src": "/app.js" }] },
//!   "resources": [{ "name": "https://cdn.example.net/a.js", "transferSize": 1200 }],
//!   "cookies": "session=abc; theme=dark",
//!   "localStorage": [{ "key": "authToken", "value": "..." }]
//! }
//! ```
//!
//! HEAD probes are answered live by an [`HttpProber`], or refused when the
//! context runs offline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    CancellationToken, CollectionError, CollectionResult, Document, Location, NavigationTiming,
    PageContext, ProbeResponse, ResourceEntry, ServiceWorkerInfo, StorageEntry,
};
use thiserror::Error;

use crate::prober::HttpProber;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot has no usable page URL: {0}")]
    Location(#[source] CollectionError),
}

pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub document: Document,
    pub resources: Vec<ResourceEntry>,
    pub navigation_timing: Option<NavigationTiming>,
    pub long_task_count: usize,
    /// `document.cookie` as captured.
    pub cookies: String,
    pub local_storage: Vec<StorageEntry>,
    pub session_storage: Vec<StorageEntry>,
    pub service_worker: Option<ServiceWorkerInfo>,
}

impl PageSnapshot {
    /// Read a snapshot file.
    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An empty page at `url`; only probe-driven checks have anything to see.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

pub struct SnapshotContext {
    location: Location,
    snapshot: PageSnapshot,
    prober: Option<HttpProber>,
    token: CancellationToken,
}

impl SnapshotContext {
    /// Pass `None` for `prober` to refuse every HEAD probe.
    pub fn new(snapshot: PageSnapshot, prober: Option<HttpProber>) -> SnapshotResult<Self> {
        let location = Location::parse(&snapshot.url).map_err(SnapshotError::Location)?;
        Ok(Self {
            location,
            snapshot,
            prober,
            token: CancellationToken::new(),
        })
    }

    /// Handle used to cancel in-flight collectors, e.g. on Ctrl-C.
    pub fn cancellation_handle(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[async_trait]
impl PageContext for SnapshotContext {
    fn location(&self) -> &Location {
        &self.location
    }

    fn document(&self) -> &Document {
        &self.snapshot.document
    }

    fn resources(&self) -> &[ResourceEntry] {
        &self.snapshot.resources
    }

    fn navigation_timing(&self) -> Option<&NavigationTiming> {
        self.snapshot.navigation_timing.as_ref()
    }

    fn long_task_count(&self) -> usize {
        self.snapshot.long_task_count
    }

    fn cookie_string(&self) -> &str {
        &self.snapshot.cookies
    }

    fn local_storage(&self) -> &[StorageEntry] {
        &self.snapshot.local_storage
    }

    fn session_storage(&self) -> &[StorageEntry] {
        &self.snapshot.session_storage
    }

    fn service_worker(&self) -> Option<ServiceWorkerInfo> {
        self.snapshot.service_worker
    }

    async fn fetch_head(&self, url: &str) -> CollectionResult<ProbeResponse> {
        match &self.prober {
            Some(prober) => prober.head(url).await,
            None => Err(CollectionError::network(format!(
                "probes disabled, not fetching {url}"
            ))),
        }
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitediag_core::CollectionCause;
    use std::io::Write;

    #[test]
    fn test_load_camel_case_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "url": "https://example.com/shop",
                "document": {{ "title": "Shop", "styleSheets": [{{ "href": null, "rules": [".a{{}}"] }}] }},
                "navigationTiming": {{ "requestStart": 5, "responseStart": 55, "loadEventEnd": 900 }},
                "longTaskCount": 3,
                "cookies": "a=1; Secure",
                "serviceWorker": {{ "supported": true, "registrations": 0 }}
            }}"#
        )
        .unwrap();

        let snapshot = PageSnapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.document.title(), Some("Shop"));
        assert_eq!(snapshot.document.style_sheets.len(), 1);
        assert_eq!(snapshot.navigation_timing.unwrap().ttfb_ms(), 50.0);
        assert_eq!(snapshot.long_task_count, 3);
        assert!(snapshot.resources.is_empty());
        assert_eq!(
            snapshot.service_worker,
            Some(ServiceWorkerInfo {
                supported: true,
                registrations: 0
            })
        );
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        let err = PageSnapshot::load(file.path()).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }

    #[test]
    fn test_context_requires_absolute_url() {
        let err = SnapshotContext::new(PageSnapshot::for_url("example.com"), None)
            .err()
            .unwrap();
        assert!(matches!(err, SnapshotError::Location(_)));
    }

    #[tokio::test]
    async fn test_offline_context_refuses_probes() {
        let ctx = SnapshotContext::new(PageSnapshot::for_url("https://example.com/a"), None)
            .unwrap();
        assert_eq!(ctx.location().origin, "https://example.com");
        assert_eq!(ctx.cookie_string(), "");
        assert!(ctx.navigation_timing().is_none());

        let err = ctx.fetch_head("https://example.com/").await.unwrap_err();
        assert_eq!(err.cause, CollectionCause::Network);
    }

    #[test]
    fn test_cancellation_handle_shares_state() {
        let ctx = SnapshotContext::new(PageSnapshot::for_url("https://example.com/"), None)
            .unwrap();
        ctx.cancellation_handle().cancel();
        assert!(ctx.cancellation().is_cancelled());
    }
}
