//! In-memory fake of [`PageContext`] (testing only)
//!
//! `FakeContext` serves a fixed page snapshot and answers HEAD probes from a
//! canned table, with an optional artificial delay for timeout and
//! cancellation tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::context::{
    Location, NavigationTiming, PageContext, ProbeResponse, ResourceEntry, ServiceWorkerInfo,
    StorageEntry,
};
use crate::document::Document;
use crate::error::{CollectionError, CollectionResult};

/// Canned page environment.
#[derive(Debug)]
pub struct FakeContext {
    location: Location,
    document: Document,
    resources: Vec<ResourceEntry>,
    navigation_timing: Option<NavigationTiming>,
    long_tasks: usize,
    cookies: String,
    local_storage: Vec<StorageEntry>,
    session_storage: Vec<StorageEntry>,
    service_worker: Option<ServiceWorkerInfo>,
    probes: HashMap<String, CollectionResult<ProbeResponse>>,
    probe_delay: Option<Duration>,
    probe_calls: AtomicUsize,
    token: CancellationToken,
}

impl FakeContext {
    /// Empty page at `href`. Panics on an invalid URL.
    pub fn new(href: &str) -> Self {
        Self {
            location: Location::parse(href).expect("valid fake page URL"),
            document: Document::default(),
            resources: Vec::new(),
            navigation_timing: None,
            long_tasks: 0,
            cookies: String::new(),
            local_storage: Vec::new(),
            session_storage: Vec::new(),
            service_worker: None,
            probes: HashMap::new(),
            probe_delay: None,
            probe_calls: AtomicUsize::new(0),
            token: CancellationToken::new(),
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceEntry>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_navigation_timing(mut self, timing: NavigationTiming) -> Self {
        self.navigation_timing = Some(timing);
        self
    }

    pub fn with_long_tasks(mut self, count: usize) -> Self {
        self.long_tasks = count;
        self
    }

    pub fn with_cookies(mut self, cookies: &str) -> Self {
        self.cookies = cookies.to_string();
        self
    }

    pub fn with_local_storage(mut self, entries: &[(&str, &str)]) -> Self {
        self.local_storage = storage_entries(entries);
        self
    }

    pub fn with_session_storage(mut self, entries: &[(&str, &str)]) -> Self {
        self.session_storage = storage_entries(entries);
        self
    }

    pub fn with_service_worker(mut self, info: ServiceWorkerInfo) -> Self {
        self.service_worker = Some(info);
        self
    }

    /// Answer HEAD `url` with `status` and the given headers.
    pub fn with_probe(mut self, url: &str, status: u16, headers: &[(&str, &str)]) -> Self {
        let response = ProbeResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            elapsed: Duration::from_millis(25),
        };
        self.probes.insert(url.to_string(), Ok(response));
        self
    }

    /// Answer HEAD `url` with a full response, including its elapsed time.
    pub fn with_probe_response(mut self, url: &str, response: ProbeResponse) -> Self {
        self.probes.insert(url.to_string(), Ok(response));
        self
    }

    /// Fail HEAD `url` with the given error.
    pub fn with_probe_error(mut self, url: &str, error: CollectionError) -> Self {
        self.probes.insert(url.to_string(), Err(error));
        self
    }

    /// Delay every probe answer.
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    /// Number of `fetch_head` calls served so far.
    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

fn storage_entries(entries: &[(&str, &str)]) -> Vec<StorageEntry> {
    entries
        .iter()
        .map(|(k, v)| StorageEntry {
            key: k.to_string(),
            value: v.to_string(),
        })
        .collect()
}

#[async_trait]
impl PageContext for FakeContext {
    fn location(&self) -> &Location {
        &self.location
    }

    fn document(&self) -> &Document {
        &self.document
    }

    fn resources(&self) -> &[ResourceEntry] {
        &self.resources
    }

    fn navigation_timing(&self) -> Option<&NavigationTiming> {
        self.navigation_timing.as_ref()
    }

    fn long_task_count(&self) -> usize {
        self.long_tasks
    }

    fn cookie_string(&self) -> &str {
        &self.cookies
    }

    fn local_storage(&self) -> &[StorageEntry] {
        &self.local_storage
    }

    fn session_storage(&self) -> &[StorageEntry] {
        &self.session_storage
    }

    fn service_worker(&self) -> Option<ServiceWorkerInfo> {
        self.service_worker
    }

    async fn fetch_head(&self, url: &str) -> CollectionResult<ProbeResponse> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.probes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(CollectionError::network(format!("connection refused: {url}"))))
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}
