// One tokio task per (project, test), bounded by a semaphore.

use crate::backend::SessionFactory;
use crate::config::{Project, SuiteConfig};
use crate::error::{Result, SmokeError};
use crate::fixtures::Fixtures;
use crate::model::{AttemptResult, RunSummary, TestResult, TestStatus};
use crate::pages::BasePage;
use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type TestFn = Arc<dyn Fn(Fixtures) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Called once per finished test, in completion order.
pub type ResultCallback = Arc<dyn Fn(&TestResult) + Send + Sync>;

#[derive(Clone)]
pub struct TestCase {
    pub suite: String,
    pub title: String,
    body: TestFn,
}

impl TestCase {
    pub fn new<F, Fut>(suite: &str, title: &str, body: F) -> Self
    where
        F: Fn(Fixtures) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            suite: suite.to_string(),
            title: title.to_string(),
            body: Arc::new(move |fixtures| body(fixtures).boxed()),
        }
    }

    pub fn full_title(&self) -> String {
        format!("{} › {}", self.suite, self.title)
    }

    /// Case-insensitive substring match of any filter against the full
    /// title. No filters matches everything.
    pub fn matches(&self, filters: &[String]) -> bool {
        if filters.is_empty() {
            return true;
        }
        let title = self.full_title().to_lowercase();
        filters
            .iter()
            .any(|filter| title.contains(&filter.to_lowercase()))
    }

    /// Directory-safe name for this test under `project`.
    pub fn slug(&self, project: &Project) -> String {
        slugify(&format!("{}-{}-{}", self.suite, self.title, project.name))
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("suite", &self.suite)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestRegistry {
    cases: Vec<TestCase>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, case: TestCase) -> &mut Self {
        self.cases.push(case);
        self
    }

    pub fn extend(&mut self, cases: impl IntoIterator<Item = TestCase>) -> &mut Self {
        self.cases.extend(cases);
        self
    }

    pub fn filter(&self, filters: &[String]) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|case| case.matches(filters))
            .cloned()
            .collect()
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

pub struct Runner {
    config: Arc<SuiteConfig>,
    factory: Arc<dyn SessionFactory>,
    on_result: Option<ResultCallback>,
}

impl Runner {
    pub fn new(config: Arc<SuiteConfig>, factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            config,
            factory,
            on_result: None,
        }
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.on_result = Some(callback);
        self
    }

    /// Run every case against every project. Results come back in schedule
    /// order (project by project) regardless of completion order.
    pub async fn run(&self, cases: &[TestCase], projects: &[Project]) -> RunSummary {
        let started_at = Utc::now();
        let scheduled = cases.len() * projects.len();
        let permits = self.config.workers.unwrap_or(scheduled).max(1);
        let semaphore = Arc::new(Semaphore::new(permits));

        info!(
            "Running {} tests across {} projects with {} workers against {}",
            cases.len(),
            projects.len(),
            permits,
            self.config.base_url
        );

        let mut handles = Vec::with_capacity(scheduled);
        let mut scheduled_meta = Vec::with_capacity(scheduled);
        for project in projects {
            for case in cases {
                let semaphore = semaphore.clone();
                let config = self.config.clone();
                let factory = self.factory.clone();
                let on_result = self.on_result.clone();
                let case = case.clone();
                let project = project.clone();
                scheduled_meta.push((case.suite.clone(), case.title.clone(), project.name.clone()));

                handles.push(tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let result = run_test(&config, &factory, &case, &project).await;
                    if let Some(callback) = &on_result {
                        callback(&result);
                    }
                    result
                }));
            }
        }

        let results = join_all(handles)
            .await
            .into_iter()
            .zip(scheduled_meta)
            .map(|(joined, (suite, title, project))| match joined {
                Ok(result) => result,
                Err(e) => TestResult {
                    suite,
                    title,
                    project,
                    status: TestStatus::Failed,
                    attempts: vec![AttemptResult {
                        attempt: 0,
                        status: TestStatus::Failed,
                        duration_ms: 0,
                        error: Some(format!("test task aborted: {}", e)),
                        artifacts: Vec::new(),
                    }],
                },
            })
            .collect();

        RunSummary {
            run_id: Uuid::new_v4().to_string(),
            base_url: self.config.base_url.to_string(),
            started_at,
            finished_at: Utc::now(),
            results,
        }
    }
}

async fn run_test(
    config: &Arc<SuiteConfig>,
    factory: &Arc<dyn SessionFactory>,
    case: &TestCase,
    project: &Project,
) -> TestResult {
    let slug = case.slug(project);
    let mut attempts = Vec::new();
    let mut status = TestStatus::Failed;

    for attempt in 0..=config.retries {
        let attempt_dir = if attempt == 0 {
            config.artifacts_dir().join(&slug)
        } else {
            config.artifacts_dir().join(format!("{}-retry{}", slug, attempt))
        };
        let result = run_attempt(config, factory, case, project, attempt, attempt_dir).await;
        let passed = result.status == TestStatus::Passed;
        status = result.status;
        attempts.push(result);

        if passed {
            if attempt > 0 {
                status = TestStatus::Flaky;
            }
            break;
        }
        if attempt < config.retries {
            debug!("Retrying {} [{}] (attempt {})", case.full_title(), project.name, attempt + 1);
        }
    }

    let result = TestResult {
        suite: case.suite.clone(),
        title: case.title.clone(),
        project: project.name.clone(),
        status,
        attempts,
    };
    if result.status.is_failure() {
        warn!("{} {}", result.status, result.full_title());
    } else {
        info!("{} {}", result.status, result.full_title());
    }
    result
}

async fn run_attempt(
    config: &Arc<SuiteConfig>,
    factory: &Arc<dyn SessionFactory>,
    case: &TestCase,
    project: &Project,
    attempt: u32,
    attempt_dir: PathBuf,
) -> AttemptResult {
    let fixtures = Fixtures::new(config.clone(), project.clone(), factory.clone(), attempt_dir.clone());
    let started = Instant::now();

    let body = AssertUnwindSafe((case.body)(fixtures.clone())).catch_unwind();
    let (status, error) = match tokio::time::timeout(config.test_timeout, body).await {
        Ok(Ok(Ok(()))) => (TestStatus::Passed, None),
        Ok(Ok(Err(e))) => (TestStatus::Failed, Some(e.to_string())),
        Ok(Err(_)) => (TestStatus::Failed, Some("test panicked".to_string())),
        Err(_) => (
            TestStatus::TimedOut,
            Some(
                SmokeError::Timeout {
                    what: format!("test {}", case.full_title()),
                    after: config.test_timeout,
                }
                .to_string(),
            ),
        ),
    };
    let duration_ms = started.elapsed().as_millis() as u64;

    let mut artifacts = Vec::new();
    if let Some(session) = fixtures.active_session() {
        if status != TestStatus::Passed && config.artifacts.screenshot_on_failure {
            let page = BasePage::new(session.clone(), &attempt_dir);
            match page.screenshot("failure").await {
                Ok(path) => artifacts.push(path),
                Err(e) => warn!("Failed to capture screenshot for {}: {}", case.full_title(), e),
            }
        }
        if attempt == 1 && config.artifacts.trace_on_first_retry {
            match write_trace(&attempt_dir, &session.trace()).await {
                Ok(path) => artifacts.push(path),
                Err(e) => warn!("Failed to write trace for {}: {}", case.full_title(), e),
            }
        }
    }
    fixtures.teardown().await;

    AttemptResult {
        attempt,
        status,
        duration_ms,
        error,
        artifacts,
    }
}

async fn write_trace(dir: &std::path::Path, entries: &[docsmoke_browser::TraceEntry]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join("trace.json");
    let json = serde_json::to_string_pretty(entries)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmoke_browser::BrowserKind;

    fn case(suite: &str, title: &str) -> TestCase {
        TestCase::new(suite, title, |_fixtures| async { Ok(()) })
    }

    #[test]
    fn test_filters_match_full_title_case_insensitively() {
        let case = case("Smoke", "home page loads");
        assert!(case.matches(&[]));
        assert!(case.matches(&["HOME".to_string()]));
        assert!(case.matches(&["smoke › home".to_string()]));
        assert!(!case.matches(&["links".to_string()]));
    }

    #[test]
    fn test_slugs_are_directory_safe() {
        let project = Project::desktop("mobile-chrome", BrowserKind::Chromium);
        let case = case("Smoke", "/getting-started renders (no 404)");
        assert_eq!(
            case.slug(&project),
            "smoke-getting-started-renders-no-404-mobile-chrome"
        );
    }

    #[test]
    fn test_registry_filters() {
        let mut registry = TestRegistry::new();
        registry
            .add(case("Smoke", "home"))
            .add(case("Links", "internal links"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.filter(&["link".to_string()]).len(), 1);
    }
}
