use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Ok,
    Broken,
    ExternalSkipped,
    Timeout,
    Error,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Ok => "ok",
            LinkStatus::Broken => "broken",
            LinkStatus::ExternalSkipped => "external_skipped",
            LinkStatus::Timeout => "timeout",
            LinkStatus::Error => "error",
        }
    }

    /// Transient failures that count against the crawl tolerance.
    pub fn is_transient_failure(&self) -> bool {
        matches!(self, LinkStatus::Timeout | LinkStatus::Error)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One anchor visited (or deliberately skipped) during a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub display_text: String,
    pub href: String,
    pub status: LinkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LinkRecord {
    pub fn new(display_text: impl Into<String>, href: impl Into<String>, status: LinkStatus) -> Self {
        Self {
            display_text: display_text.into(),
            href: href.into(),
            status,
            http_status: None,
            detail: None,
        }
    }

    pub fn with_http_status(mut self, status: Option<u16>) -> Self {
        self.http_status = status;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Element counts per UI region, used for assertion thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCounts {
    regions: BTreeMap<String, usize>,
}

impl DiscoveryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: impl Into<String>, count: usize) {
        self.regions.insert(region.into(), count);
    }

    pub fn get(&self, region: &str) -> usize {
        self.regions.get(region).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.regions.values().sum()
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Regions in which nothing was found.
    pub fn empty_regions(&self) -> Vec<&str> {
        self.regions
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    /// Failed at least once, then passed on retry.
    Flaky,
    Skipped,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::TimedOut => "timed_out",
            TestStatus::Flaky => "flaky",
            TestStatus::Skipped => "skipped",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::TimedOut)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Zero for the initial run, one for the first retry, and so on.
    pub attempt: u32,
    pub status: TestStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub title: String,
    pub project: String,
    pub status: TestStatus,
    pub attempts: Vec<AttemptResult>,
}

impl TestResult {
    pub fn full_title(&self) -> String {
        format!("[{}] {} › {}", self.project, self.suite, self.title)
    }

    pub fn duration_ms(&self) -> u64 {
        self.attempts.iter().map(|a| a.duration_ms).sum()
    }

    pub fn retries(&self) -> u32 {
        self.attempts.len().saturating_sub(1) as u32
    }

    /// Error of the last failed attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find_map(|attempt| attempt.error.as_deref())
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.attempts.iter().flat_map(|a| a.artifacts.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub flaky: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.timed_out + self.flaky + self.skipped
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for result in &self.results {
            match result.status {
                TestStatus::Passed => counts.passed += 1,
                TestStatus::Failed => counts.failed += 1,
                TestStatus::TimedOut => counts.timed_out += 1,
                TestStatus::Flaky => counts.flaky += 1,
                TestStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.status.is_failure())
    }

    /// True when no test failed; flaky tests do not fail the run.
    pub fn success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
