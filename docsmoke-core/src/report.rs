// Report generation from run results

use crate::config::{ArtifactPolicy, SuiteConfig};
use crate::crawl::CrawlReport;
use crate::error::{Result, SmokeError};
use crate::model::{LinkStatus, RunSummary, TestResult, TestStatus};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    List,
    Html,
    Json,
    Junit,
}

impl ReporterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReporterKind::List => "list",
            ReporterKind::Html => "html",
            ReporterKind::Json => "json",
            ReporterKind::Junit => "junit",
        }
    }
}

impl FromStr for ReporterKind {
    type Err = SmokeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "list" | "line" => Ok(ReporterKind::List),
            "html" => Ok(ReporterKind::Html),
            "json" => Ok(ReporterKind::Json),
            "junit" | "xml" => Ok(ReporterKind::Junit),
            other => Err(SmokeError::Config(format!("unknown reporter '{}'", other))),
        }
    }
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// One terminal line for a finished test.
pub fn format_result_line(result: &TestResult) -> String {
    let mark = match result.status {
        TestStatus::Passed => "✓".green(),
        TestStatus::Flaky => "±".yellow(),
        TestStatus::Skipped => "-".dimmed(),
        TestStatus::Failed | TestStatus::TimedOut => "✗".red(),
    };
    let mut line = format!(
        "  {} {} {}",
        mark,
        result.full_title(),
        format!("({}ms)", result.duration_ms()).dimmed()
    );
    if result.retries() > 0 {
        line.push_str(&format!(" {}", format!("[retries: {}]", result.retries()).dimmed()));
    }
    line
}

pub fn generate_list_report(summary: &RunSummary) -> String {
    let mut report = String::new();
    for result in &summary.results {
        report.push_str(&format_result_line(result));
        report.push('\n');
    }
    report.push('\n');
    report.push_str(&generate_run_summary(summary));
    report
}

/// Failure details and the totals line, without the per-test lines.
pub fn generate_run_summary(summary: &RunSummary) -> String {
    let mut report = String::new();
    let failures: Vec<&TestResult> = summary.failures().collect();
    if !failures.is_empty() {
        report.push_str(RULE);
        report.push_str("\nFAILURES\n");
        report.push_str(RULE);
        report.push_str("\n\n");

        for (idx, result) in failures.iter().enumerate() {
            report.push_str(&format!(
                "{}) {} [{}]\n\n",
                idx + 1,
                result.full_title().bold(),
                result.status.as_str().red()
            ));
            if let Some(error) = result.last_error() {
                report.push_str(&indent(error, "    "));
                report.push('\n');
            }
            for artifact in result.artifacts() {
                report.push_str(&format!("    {} {}\n", "artifact:".dimmed(), artifact.display()));
            }
            report.push('\n');
        }
    }

    let counts = summary.counts();
    let mut line = vec![format!("{} passed", counts.passed).green().to_string()];
    if counts.flaky > 0 {
        line.push(format!("{} flaky", counts.flaky).yellow().to_string());
    }
    if counts.failed > 0 {
        line.push(format!("{} failed", counts.failed).red().to_string());
    }
    if counts.timed_out > 0 {
        line.push(format!("{} timed out", counts.timed_out).red().to_string());
    }
    if counts.skipped > 0 {
        line.push(format!("{} skipped", counts.skipped).dimmed().to_string());
    }
    report.push_str(&format!(
        "  {} ({} tests, {:.1}s)\n",
        line.join(", "),
        counts.total(),
        summary.duration_ms() as f64 / 1000.0
    ));

    report
}

pub fn generate_json_report(
    summary: &RunSummary,
    artifacts: &ArtifactPolicy,
) -> std::result::Result<String, serde_json::Error> {
    let counts = summary.counts();
    let screenshot = if artifacts.screenshot_on_failure { "only-on-failure" } else { "off" };
    let trace = if artifacts.trace_on_first_retry { "on-first-retry" } else { "off" };
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "docsmoke",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "run": {
                "id": summary.run_id,
                "base_url": summary.base_url,
                "started_at": summary.started_at.to_rfc3339(),
                "finished_at": summary.finished_at.to_rfc3339(),
                "duration_ms": summary.duration_ms(),
                "success": summary.success(),
                "artifacts": {
                    "screenshot": screenshot,
                    "trace": trace,
                    "video": "unavailable"
                }
            },
            "summary": {
                "total": counts.total(),
                "passed": counts.passed,
                "failed": counts.failed,
                "timed_out": counts.timed_out,
                "flaky": counts.flaky,
                "skipped": counts.skipped
            },
            "results": summary.results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_junit_report(summary: &RunSummary) -> String {
    let mut suites: BTreeMap<(&str, &str), Vec<&TestResult>> = BTreeMap::new();
    for result in &summary.results {
        suites
            .entry((result.project.as_str(), result.suite.as_str()))
            .or_default()
            .push(result);
    }

    let counts = summary.counts();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<testsuites name=\"docsmoke\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
        counts.total(),
        counts.failed + counts.timed_out,
        counts.skipped,
        summary.duration_ms() as f64 / 1000.0
    ));

    for ((project, suite), results) in suites {
        let failures = results.iter().filter(|r| r.status.is_failure()).count();
        let skipped = results
            .iter()
            .filter(|r| r.status == TestStatus::Skipped)
            .count();
        let time: u64 = results.iter().map(|r| r.duration_ms()).sum();
        xml.push_str(&format!(
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
            xml_escape(&format!("[{}] {}", project, suite)),
            results.len(),
            failures,
            skipped,
            time as f64 / 1000.0
        ));

        for result in results {
            xml.push_str(&format!(
                "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
                xml_escape(&result.title),
                xml_escape(&format!("{}.{}", project, suite)),
                result.duration_ms() as f64 / 1000.0
            ));
            match result.status {
                TestStatus::Passed | TestStatus::Flaky => xml.push_str(" />\n"),
                TestStatus::Skipped => xml.push_str(">\n      <skipped />\n    </testcase>\n"),
                TestStatus::Failed | TestStatus::TimedOut => {
                    let message = result.last_error().unwrap_or("failed");
                    let first_line = message.lines().next().unwrap_or(message);
                    xml.push_str(">\n");
                    xml.push_str(&format!(
                        "      <failure message=\"{}\" type=\"{}\">{}</failure>\n",
                        xml_escape(first_line),
                        result.status.as_str(),
                        xml_escape(message)
                    ));
                    let artifacts: Vec<String> = result
                        .artifacts()
                        .map(|p| format!("[[ATTACHMENT|{}]]", p.display()))
                        .collect();
                    if !artifacts.is_empty() {
                        xml.push_str(&format!(
                            "      <system-out>{}</system-out>\n",
                            xml_escape(&artifacts.join("\n"))
                        ));
                    }
                    xml.push_str("    </testcase>\n");
                }
            }
        }
        xml.push_str("  </testsuite>\n");
    }

    xml.push_str("</testsuites>\n");
    xml
}

pub fn generate_html_report(summary: &RunSummary) -> String {
    let counts = summary.counts();
    let mut rows = String::new();
    for result in &summary.results {
        let error = result
            .last_error()
            .map(|e| format!("<pre>{}</pre>", html_escape(e)))
            .unwrap_or_default();
        let artifacts: String = result
            .artifacts()
            .map(|p| {
                let href = html_escape(&p.display().to_string());
                format!("<a href=\"{0}\">{0}</a><br>", href)
            })
            .collect();
        rows.push_str(&format!(
            "<tr class=\"{status}\"><td>{project}</td><td>{suite}</td><td>{title}</td>\
             <td>{status}</td><td>{duration}ms</td><td>{retries}</td><td>{error}{artifacts}</td></tr>\n",
            status = result.status.as_str(),
            project = html_escape(&result.project),
            suite = html_escape(&result.suite),
            title = html_escape(&result.title),
            duration = result.duration_ms(),
            retries = result.retries(),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>docsmoke report</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; width: 100%; }}
td, th {{ border: 1px solid #ddd; padding: 0.4rem; text-align: left; vertical-align: top; }}
tr.passed td:nth-child(4) {{ color: #1a7f37; }}
tr.flaky td:nth-child(4) {{ color: #9a6700; }}
tr.failed td:nth-child(4), tr.timed_out td:nth-child(4) {{ color: #cf222e; }}
pre {{ white-space: pre-wrap; margin: 0; }}
</style>
</head>
<body>
<h1>docsmoke report</h1>
<p>Run {run_id} against {base_url}, started {started}</p>
<p>{passed} passed, {flaky} flaky, {failed} failed, {timed_out} timed out, {skipped} skipped ({total} tests, {duration:.1}s)</p>
<table>
<thead><tr><th>Project</th><th>Suite</th><th>Test</th><th>Status</th><th>Duration</th><th>Retries</th><th>Details</th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</body>
</html>
"#,
        run_id = html_escape(&summary.run_id),
        base_url = html_escape(&summary.base_url),
        started = summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        passed = counts.passed,
        flaky = counts.flaky,
        failed = counts.failed,
        timed_out = counts.timed_out,
        skipped = counts.skipped,
        total = counts.total(),
        duration = summary.duration_ms() as f64 / 1000.0,
        rows = rows,
    )
}

/// Text report for an ad-hoc crawl.
pub fn generate_crawl_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push_str("\n\n# Summary:\n");
    out.push_str(&format!("  Origin: {}\n", report.origin));
    out.push_str(&format!("  Links checked: {}\n", report.records.len()));
    for status in [
        LinkStatus::Ok,
        LinkStatus::Broken,
        LinkStatus::ExternalSkipped,
        LinkStatus::Timeout,
        LinkStatus::Error,
    ] {
        let count = report.count(status);
        if count > 0 {
            out.push_str(&format!("  {}: {}\n", status, count));
        }
    }
    out.push('\n');
    out.push_str(RULE);
    out.push_str("\n\n");

    for record in &report.records {
        let status = match record.status {
            LinkStatus::Ok => record.status.as_str().green(),
            LinkStatus::Broken => record.status.as_str().red(),
            LinkStatus::ExternalSkipped => record.status.as_str().dimmed(),
            LinkStatus::Timeout | LinkStatus::Error => record.status.as_str().yellow(),
        };
        let code = record
            .http_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "---".to_string());
        let mut line = format!("  {} {} {}", status, code, record.href);
        let text = record.display_text.trim();
        if !text.is_empty() {
            line.push_str(&format!(" {}", format!("\"{}\"", text).dimmed()));
        }
        if let Some(detail) = &record.detail {
            line.push_str(&format!(" {}", detail.dimmed()));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Write every file-based reporter's output under `config.output_dir`.
/// The list reporter has no file and is skipped here.
pub fn write_reports(
    summary: &RunSummary,
    reporters: &[ReporterKind],
    config: &SuiteConfig,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for reporter in reporters {
        let (content, path) = match reporter {
            ReporterKind::List => continue,
            ReporterKind::Html => (
                generate_html_report(summary),
                config.report_dir().join("index.html"),
            ),
            ReporterKind::Json => (
                generate_json_report(summary, &config.artifacts)?,
                config.output_dir.join("results.json"),
            ),
            ReporterKind::Junit => (
                generate_junit_report(summary),
                config.output_dir.join("junit.xml"),
            ),
        };
        save_report(&content, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() && c != '\n' && c != '\t' && c != '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_names_parse() {
        assert_eq!("JSON".parse::<ReporterKind>().unwrap(), ReporterKind::Json);
        assert_eq!("xml".parse::<ReporterKind>().unwrap(), ReporterKind::Junit);
        assert!("tap".parse::<ReporterKind>().is_err());
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(
            xml_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
        assert_eq!(xml_escape("bell\u{7}"), "bell");
    }

    #[test]
    fn test_save_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report/index.html");
        save_report("<html></html>", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<html></html>");
    }
}
