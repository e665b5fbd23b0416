//! Cookie & storage hygiene check.
//!
//! Cookie flags are detected by substring on the raw `document.cookie`
//! entries. Storage keys are matched against a case-insensitive pattern.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sitediag_core::{
    Collected, CollectionResult, Collector, Finding, ModuleDescriptor, PageContext,
    ScoringResult, Scorer,
};

use super::{kb_to_bytes, total_bytes};
use crate::error::{ChecksError, ChecksResult};

pub const NAME: &str = "storage";
pub const TITLE: &str = "Storage & Cookie Policy Check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Regex matched (case-insensitively) against storage keys.
    pub sensitive_key_pattern: String,
    #[serde(rename = "largeLocalStorageKB")]
    pub large_local_storage_kb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sensitive_key_pattern:
                r"token|secret|passw(or)?d|jwt|auth|session|api[_-]?key|credential".to_string(),
            large_local_storage_kb: 512,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CookieFlags {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: bool,
}

impl CookieFlags {
    fn parse(entry: &str) -> Self {
        Self {
            name: entry.split('=').next().unwrap_or_default().trim().to_string(),
            secure: entry.contains("Secure"),
            http_only: entry.contains("HttpOnly"),
            same_site: entry.contains("SameSite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageSnapshot {
    pub cookies: Vec<CookieFlags>,
    pub local_keys: Vec<String>,
    pub session_keys: Vec<String>,
    /// Sum of localStorage value lengths.
    pub local_storage_bytes: u64,
}

pub struct StorageCollector;

#[async_trait]
impl Collector for StorageCollector {
    type Raw = StorageSnapshot;

    async fn collect(&self, ctx: &dyn PageContext) -> CollectionResult<Collected<StorageSnapshot>> {
        let cookies = ctx
            .cookie_string()
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(CookieFlags::parse)
            .collect();

        let local = ctx.local_storage();
        Ok(Collected::complete(StorageSnapshot {
            cookies,
            local_keys: local.iter().map(|e| e.key.clone()).collect(),
            session_keys: ctx.session_storage().iter().map(|e| e.key.clone()).collect(),
            local_storage_bytes: total_bytes(local.iter().map(|e| e.value.len() as u64)),
        }))
    }
}

pub struct StorageScorer {
    sensitive: Regex,
    large_local_storage_kb: u64,
}

impl StorageScorer {
    pub fn new(config: &StorageConfig) -> ChecksResult<Self> {
        let sensitive = Regex::new(&format!("(?i){}", config.sensitive_key_pattern)).map_err(
            |source| ChecksError::InvalidPattern {
                module: NAME,
                option: "sensitiveKeyPattern",
                source,
            },
        )?;
        Ok(Self {
            sensitive,
            large_local_storage_kb: config.large_local_storage_kb,
        })
    }
}

fn cookies_without(cookies: &[CookieFlags], flag: impl Fn(&CookieFlags) -> bool) -> Vec<&str> {
    cookies
        .iter()
        .filter(|&c| !flag(c))
        .map(|c| c.name.as_str())
        .collect()
}

fn cookie_finding(id: &str, flag: &str, names: &[&str], warn: bool) -> Finding {
    let message = format!("{} cookie(s) without the {flag} flag", names.len());
    let finding = if warn {
        Finding::warn(id, message)
    } else {
        Finding::info(id, message)
    };
    finding
        .with_metric("count", names.len())
        .with_metric("cookies", names.join(", "))
}

impl Scorer for StorageScorer {
    type Raw = StorageSnapshot;

    fn score(&self, raw: &StorageSnapshot) -> ScoringResult<Vec<Finding>> {
        let mut findings = Vec::new();

        let no_secure = cookies_without(&raw.cookies, |c| c.secure);
        if !no_secure.is_empty() {
            findings.push(cookie_finding("cookies-missing-secure", "Secure", &no_secure, true));
        }
        let no_http_only = cookies_without(&raw.cookies, |c| c.http_only);
        if !no_http_only.is_empty() {
            findings.push(cookie_finding(
                "cookies-missing-httponly",
                "HttpOnly",
                &no_http_only,
                true,
            ));
        }
        let no_same_site = cookies_without(&raw.cookies, |c| c.same_site);
        if !no_same_site.is_empty() {
            findings.push(cookie_finding(
                "cookies-missing-samesite",
                "SameSite",
                &no_same_site,
                false,
            ));
        }

        let sensitive: Vec<&str> = raw
            .local_keys
            .iter()
            .chain(&raw.session_keys)
            .filter(|k| self.sensitive.is_match(k))
            .map(String::as_str)
            .collect();
        if !sensitive.is_empty() {
            findings.push(
                Finding::warn(
                    "sensitive-storage-keys",
                    "Browser storage holds keys that look like tokens or secrets",
                )
                .with_metric("count", sensitive.len())
                .with_metric("keys", sensitive.join(", ")),
            );
        }

        if raw.local_storage_bytes > kb_to_bytes(self.large_local_storage_kb) {
            findings.push(
                Finding::info(
                    "large-local-storage",
                    format!(
                        "localStorage holds about {:.1} KB; prefer IndexedDB for large data",
                        raw.local_storage_bytes as f64 / 1000.0
                    ),
                )
                .with_metric("bytes", raw.local_storage_bytes),
            );
        }

        Ok(findings)
    }
}

pub fn descriptor(config: &StorageConfig) -> ChecksResult<ModuleDescriptor> {
    Ok(ModuleDescriptor::new(StorageCollector, StorageScorer::new(config)?).with_title(TITLE))
}
