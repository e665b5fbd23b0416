//! Report rendering for the terminal.

use clap::ValueEnum;
use sitediag_core::{Finding, Registry, Report, RunResult, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[CRIT]",
        Severity::Warn => "[WARN]",
        Severity::Info => "[INFO]",
    }
}

fn metrics_inline(finding: &Finding) -> String {
    finding
        .metrics()
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn text_report(out: &mut String, report: &Report) {
    out.push_str(&format!(
        "{} [{}] {} finding(s) in {}ms\n",
        report.module_name,
        report.status,
        report.findings.len(),
        report.duration_ms()
    ));
    if let Some(error) = &report.error {
        out.push_str(&format!("  error: {}\n", error.message));
    }
    for note in &report.notes {
        out.push_str(&format!("  note: {note}\n"));
    }
    for finding in &report.findings {
        out.push_str(&format!(
            "  {} {}: {}",
            severity_marker(finding.severity()),
            finding.id(),
            finding.message()
        ));
        if !finding.metrics().is_empty() {
            out.push_str(&format!(" ({})", metrics_inline(finding)));
        }
        out.push('\n');
    }
}

fn markdown_report(out: &mut String, report: &Report) {
    out.push_str(&format!("## {} ({})\n\n", report.module_name, report.status));
    if let Some(error) = &report.error {
        out.push_str(&format!("> {}\n\n", error.message));
    }
    for note in &report.notes {
        out.push_str(&format!("_{note}_\n\n"));
    }
    if report.findings.is_empty() {
        out.push_str("No findings.\n\n");
        return;
    }
    out.push_str("| Severity | Finding | Message | Metrics |\n");
    out.push_str("|---|---|---|---|\n");
    for finding in &report.findings {
        out.push_str(&format!(
            "| {} | `{}` | {} | {} |\n",
            finding.severity(),
            finding.id(),
            finding.message().replace('|', "\\|"),
            metrics_inline(finding).replace('|', "\\|")
        ));
    }
    out.push('\n');
}

pub fn render_report(report: &Report, format: OutputFormat) -> serde_json::Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => return serde_json::to_string_pretty(report),
        OutputFormat::Text => text_report(&mut out, report),
        OutputFormat::Markdown => markdown_report(&mut out, report),
    }
    Ok(out)
}

pub fn render_run(result: &RunResult, format: OutputFormat) -> serde_json::Result<String> {
    let summary = &result.summary;
    let mut out = String::new();
    match format {
        OutputFormat::Json => return serde_json::to_string_pretty(result),
        OutputFormat::Text => {
            for report in &result.reports {
                text_report(&mut out, report);
            }
            out.push_str(&format!(
                "\nRun {}: {} module(s), {} finding(s) ({} critical, {} warn, {} info)\n",
                result.run_id,
                result.reports.len(),
                summary.total,
                summary.count(Severity::Critical),
                summary.count(Severity::Warn),
                summary.count(Severity::Info)
            ));
        }
        OutputFormat::Markdown => {
            out.push_str(&format!("# Diagnostics run `{}`\n\n", result.run_id));
            out.push_str(&format!(
                "**{}** finding(s): {} critical, {} warn, {} info\n\n",
                summary.total,
                summary.count(Severity::Critical),
                summary.count(Severity::Warn),
                summary.count(Severity::Info)
            ));
            for report in &result.reports {
                markdown_report(&mut out, report);
            }
        }
    }
    Ok(out)
}

pub fn render_list(registry: &Registry, format: OutputFormat) -> serde_json::Result<String> {
    let modules: Vec<(&str, &str)> = registry
        .iter()
        .map(|(name, module)| (name, module.title().unwrap_or("")))
        .collect();

    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = modules
                .iter()
                .map(|(name, title)| serde_json::json!({ "name": name, "title": title }))
                .collect();
            return serde_json::to_string_pretty(&entries);
        }
        OutputFormat::Text => {
            let width = modules.iter().map(|(n, _)| n.len()).max().unwrap_or(0);
            for (name, title) in &modules {
                out.push_str(&format!("{name:<width$}  {title}\n"));
            }
        }
        OutputFormat::Markdown => {
            for (name, title) in &modules {
                out.push_str(&format!("- `{name}`: {title}\n"));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sitediag_core::{CollectionError, ModuleError};

    fn sample_report() -> Report {
        let now = Utc::now();
        Report::completed(
            "jsCss",
            vec![
                Finding::warn("large-js-payload", "Scripts weigh 1200 KB")
                    .with_metric("totalScriptBytes", 1_200_000u64),
                Finding::info("long-tasks", "3 long tasks"),
            ],
            vec![],
            now,
            now,
        )
    }

    #[test]
    fn test_text_report_lists_findings() {
        let text = render_report(&sample_report(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("jsCss [ok] 2 finding(s)"));
        assert!(text.contains("[WARN] large-js-payload: Scripts weigh 1200 KB (totalScriptBytes=1200000)"));
        assert!(text.contains("[INFO] long-tasks: 3 long tasks\n"));
    }

    #[test]
    fn test_json_report_is_machine_readable() {
        let json = render_report(&sample_report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["moduleName"], "jsCss");
        assert_eq!(value["findings"][0]["metrics"]["totalScriptBytes"], 1_200_000);
    }

    #[test]
    fn test_markdown_failed_report() {
        let now = Utc::now();
        let report = Report::failed(
            "security",
            &ModuleError::from(CollectionError::network("connection refused")),
            now,
            now,
        );
        let md = render_report(&report, OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("## security (failed)"));
        assert!(md.contains("connection refused"));
        assert!(md.contains("No findings."));
    }

    #[test]
    fn test_run_summary_line() {
        let result = RunResult::new(vec![sample_report()]);
        let text = render_run(&result, OutputFormat::Text).unwrap();
        assert!(text.contains("1 module(s), 2 finding(s) (0 critical, 1 warn, 1 info)"));
    }

    #[test]
    fn test_markdown_escapes_table_pipes() {
        let now = Utc::now();
        let report = Report::completed(
            "seo",
            vec![Finding::warn("title-length", "Title a | b is short").with_metric("chars", 9u64)],
            vec!["robots.txt unreachable".to_string()],
            now,
            now,
        );
        let md = render_report(&report, OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("## seo (partial)\n\n_robots.txt unreachable_\n\n"));
        assert!(md.contains("| warn | `title-length` | Title a \\| b is short | chars=9 |\n"));
    }

    #[test]
    fn test_text_list_aligns_titles() {
        let registry = sitediag_checks::core_registry(&Default::default()).unwrap();
        let text = render_list(&registry, OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        // Padded to the longest name, "dependencies".
        assert!(lines[0].starts_with(&format!("{:<12}  ", "seo")));
        assert!(lines[3].starts_with(&format!("{:<12}  ", "security")));
        assert!(lines[2].starts_with("dependencies  "));
    }
}
