//! Per-module reports and batch run results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CollectionCause, ModuleError};
use crate::finding::{Finding, Severity};

/// Outcome of one module run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Collection and scoring both completed on a full snapshot.
    Ok,
    /// The snapshot was degraded but scoring still produced findings.
    Partial,
    /// Collection or scoring failed; no findings exist.
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Ok => "ok",
            ReportStatus::Partial => "partial",
            ReportStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage of a module failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Collection,
    Scoring,
}

/// Serializable description of a module failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<CollectionCause>,
    pub message: String,
}

impl From<&ModuleError> for ErrorInfo {
    fn from(err: &ModuleError) -> Self {
        match err {
            ModuleError::Collection(e) => ErrorInfo {
                kind: ErrorKind::Collection,
                cause: Some(e.cause),
                message: e.message.clone(),
            },
            ModuleError::Scoring(e) => ErrorInfo {
                kind: ErrorKind::Scoring,
                cause: None,
                message: e.to_string(),
            },
        }
    }
}

/// The findings produced by one module in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub module_name: String,
    pub findings: Vec<Finding>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    /// Degradation reasons reported by the collector.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Report {
    /// Report for a module whose collector and scorer both completed.
    ///
    /// Status is `Partial` when the collector flagged its snapshot as degraded.
    pub fn completed(
        module_name: impl Into<String>,
        findings: Vec<Finding>,
        degraded: Vec<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let status = if degraded.is_empty() {
            ReportStatus::Ok
        } else {
            ReportStatus::Partial
        };
        Self {
            module_name: module_name.into(),
            findings,
            started_at,
            finished_at,
            status,
            error: None,
            notes: degraded,
        }
    }

    /// Report for a module that failed in either stage.
    pub fn failed(
        module_name: impl Into<String>,
        error: &ModuleError,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            findings: Vec::new(),
            started_at,
            finished_at,
            status: ReportStatus::Failed,
            error: Some(ErrorInfo::from(error)),
            notes: Vec::new(),
        }
    }

    /// Wall-clock duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Number of findings at the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }

    /// Highest severity among the findings, if any.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity()).max()
    }
}

/// Aggregate counts over a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Total findings across all reports.
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_status: BTreeMap<ReportStatus, usize>,
}

impl RunSummary {
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_status = BTreeMap::new();
        let mut total = 0;

        for report in reports {
            *by_status.entry(report.status).or_insert(0) += 1;
            for finding in &report.findings {
                *by_severity.entry(finding.severity()).or_insert(0) += 1;
                total += 1;
            }
        }

        Self {
            total,
            by_severity,
            by_status,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn status_count(&self, status: ReportStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Result of a `run_all` invocation. Produced fresh per invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: Uuid,
    pub reports: Vec<Report>,
    pub summary: RunSummary,
}

impl RunResult {
    pub fn new(reports: Vec<Report>) -> Self {
        let summary = RunSummary::from_reports(&reports);
        Self {
            run_id: Uuid::new_v4(),
            reports,
            summary,
        }
    }

    /// Find the report produced by a given module.
    pub fn report(&self, module_name: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.module_name == module_name)
    }

    /// Whether every module completed (ok or partial).
    pub fn all_completed(&self) -> bool {
        self.reports
            .iter()
            .all(|r| r.status != ReportStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectionError, ScoringError};

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_completed_report_status() {
        let ok = Report::completed("seo", vec![], vec![], now(), now());
        assert_eq!(ok.status, ReportStatus::Ok);
        assert!(ok.error.is_none());

        let partial = Report::completed(
            "jsCss",
            vec![Finding::info("unused-css", "55% unused")],
            vec!["stylesheet https://cdn.example.com/a.css is cross-origin".to_string()],
            now(),
            now(),
        );
        assert_eq!(partial.status, ReportStatus::Partial);
        assert_eq!(partial.notes.len(), 1);
    }

    #[test]
    fn test_failed_report_carries_error() {
        let err = ModuleError::from(CollectionError::timeout("HEAD timed out"));
        let report = Report::failed("security", &err, now(), now());

        assert_eq!(report.status, ReportStatus::Failed);
        assert!(report.findings.is_empty());
        let info = report.error.expect("error populated");
        assert_eq!(info.kind, ErrorKind::Collection);
        assert_eq!(info.cause, Some(CollectionCause::Timeout));
        assert!(!info.message.is_empty());
    }

    #[test]
    fn test_scoring_error_info_has_no_cause() {
        let err = ModuleError::from(ScoringError::Malformed("bad".into()));
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::Scoring);
        assert!(info.cause.is_none());
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![
            Report::completed(
                "a",
                vec![
                    Finding::warn("x", "x"),
                    Finding::critical("y", "y"),
                    Finding::warn("z", "z"),
                ],
                vec![],
                now(),
                now(),
            ),
            Report::failed(
                "b",
                &ModuleError::from(CollectionError::network("refused")),
                now(),
                now(),
            ),
        ];

        let summary = RunSummary::from_reports(&reports);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(Severity::Warn), 2);
        assert_eq!(summary.count(Severity::Critical), 1);
        assert_eq!(summary.count(Severity::Info), 0);
        assert_eq!(summary.status_count(ReportStatus::Ok), 1);
        assert_eq!(summary.status_count(ReportStatus::Failed), 1);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = Report::completed("seo", vec![], vec![], now(), now());
        let v = serde_json::to_value(&report).unwrap();
        let obj = v.as_object().unwrap();
        for key in ["moduleName", "findings", "startedAt", "finishedAt", "status"] {
            assert!(obj.contains_key(key), "missing key: {}", key);
        }
        assert!(!obj.contains_key("error"));
        assert_eq!(v["status"], "ok");
    }

    #[test]
    fn test_worst_severity() {
        let report = Report::completed(
            "a",
            vec![Finding::info("i", "i"), Finding::warn("w", "w")],
            vec![],
            now(),
            now(),
        );
        assert_eq!(report.worst_severity(), Some(Severity::Warn));
        assert_eq!(report.count(Severity::Info), 1);
    }
}
