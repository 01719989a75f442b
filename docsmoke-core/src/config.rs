// Run configuration, from the environment first and then the command line.

use crate::constants::{self, timeouts, user_agents, viewports};
use crate::error::{Result, SmokeError};
use crate::report::ReporterKind;
use docsmoke_browser::{BrowserKind, SessionOptions, Timeouts, Viewport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// One entry of the browser/device matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub browser: BrowserKind,
    pub viewport: Viewport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub is_mobile: bool,
}

impl Project {
    pub fn desktop(name: &str, browser: BrowserKind) -> Self {
        Self {
            name: name.to_string(),
            browser,
            viewport: viewports::DESKTOP,
            user_agent: None,
            is_mobile: false,
        }
    }

    pub fn mobile(name: &str, browser: BrowserKind, viewport: Viewport, user_agent: &str) -> Self {
        Self {
            name: name.to_string(),
            browser,
            viewport,
            user_agent: Some(user_agent.to_string()),
            is_mobile: true,
        }
    }

    pub fn default_matrix() -> Vec<Project> {
        vec![
            Project::desktop("chromium", BrowserKind::Chromium),
            Project::desktop("firefox", BrowserKind::Firefox),
            Project::desktop("webkit", BrowserKind::Webkit),
            Project::mobile(
                "mobile-chrome",
                BrowserKind::Chromium,
                viewports::PIXEL_5,
                user_agents::PIXEL_5,
            ),
            Project::mobile(
                "mobile-safari",
                BrowserKind::Webkit,
                viewports::MOBILE,
                user_agents::IPHONE_12,
            ),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Static DOM over plain HTTP; needs nothing but the site.
    Http,
    /// A running WebDriver service.
    WebDriver,
}

impl FromStr for Backend {
    type Err = SmokeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Backend::Http),
            "webdriver" | "wd" => Ok(Backend::WebDriver),
            other => Err(SmokeError::Config(format!("unknown backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPolicy {
    pub screenshot_on_failure: bool,
    pub trace_on_first_retry: bool,
    /// Neither backend can record video; kept so the policy is explicit in
    /// reports.
    pub video_on_retry: bool,
}

impl Default for ArtifactPolicy {
    fn default() -> Self {
        Self {
            screenshot_on_failure: true,
            trace_on_first_retry: true,
            video_on_retry: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub base_url: Url,
    pub ci: bool,
    pub retries: u32,
    /// `None` runs every scheduled test at once.
    pub workers: Option<usize>,
    pub timeouts: Timeouts,
    pub test_timeout: Duration,
    pub projects: Vec<Project>,
    pub reporters: Vec<ReporterKind>,
    pub output_dir: PathBuf,
    pub headed: bool,
    pub backend: Backend,
    pub webdriver_url: String,
    pub artifacts: ArtifactPolicy,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl SuiteConfig {
    /// Defaults for a local run against the default origin.
    pub fn local() -> Self {
        Self {
            base_url: Url::parse(constants::DEFAULT_BASE_URL).expect("default base URL is valid"),
            ci: false,
            retries: 0,
            workers: None,
            timeouts: Timeouts {
                action: timeouts::ACTION,
                navigation: timeouts::NAVIGATION,
                expect: timeouts::EXPECT,
            },
            test_timeout: timeouts::TEST,
            projects: Project::default_matrix(),
            reporters: vec![
                ReporterKind::List,
                ReporterKind::Html,
                ReporterKind::Json,
                ReporterKind::Junit,
            ],
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            headed: false,
            backend: Backend::Http,
            webdriver_url: constants::DEFAULT_WEBDRIVER_URL.to_string(),
            artifacts: ArtifactPolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup, so tests need not touch the
    /// process environment.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::local();

        if let Some(base) = lookup("BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = parse_base_url(&base)?;
        }

        if lookup("CI").is_some_and(|v| is_truthy(&v)) {
            config.ci = true;
            config.retries = constants::RETRIES_ON_CI;
            config.workers = Some(constants::WORKERS_ON_CI);
        }

        if let Some(endpoint) = lookup("WEBDRIVER_URL").filter(|v| !v.trim().is_empty()) {
            config.webdriver_url = endpoint;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        self.base_url = parse_base_url(base)?;
        Ok(self)
    }

    /// Interactive debugging: visible browser, one worker, no retries and
    /// no test timeout pressure.
    pub fn debug_mode(mut self) -> Self {
        self.headed = true;
        self.workers = Some(1);
        self.retries = 0;
        self.test_timeout = Duration::from_secs(60 * 60);
        self
    }

    /// Projects whose names match one of `names` (case-insensitive). An
    /// empty filter selects the whole matrix.
    pub fn select_projects(&self, names: &[String]) -> Result<Vec<Project>> {
        if names.is_empty() {
            return Ok(self.projects.clone());
        }
        let mut selected = Vec::new();
        for name in names {
            let project = self
                .projects
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    SmokeError::Config(format!(
                        "unknown project '{}' (available: {})",
                        name,
                        self.projects
                            .iter()
                            .map(|p| p.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
            if !selected.contains(project) {
                selected.push(project.clone());
            }
        }
        Ok(selected)
    }

    pub fn session_options(&self, project: &Project) -> SessionOptions {
        let defaults = SessionOptions::default();
        SessionOptions {
            base_url: Some(self.base_url.clone()),
            user_agent: project.user_agent.clone().unwrap_or(defaults.user_agent),
            viewport: project.viewport,
            timeouts: self.timeouts,
            headed: self.headed,
        }
    }

    pub fn report_dir(&self) -> PathBuf {
        self.output_dir.join("report")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.output_dir.join("artifacts")
    }
}

fn parse_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base.trim())
        .map_err(|e| SmokeError::Config(format!("invalid base URL '{}': {}", base, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SmokeError::Config(format!(
            "base URL must be http(s), got '{}'",
            base
        )));
    }
    Ok(url)
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_local_defaults() {
        let config = SuiteConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert!(!config.ci);
        assert_eq!(config.retries, 0);
        assert_eq!(config.workers, None);
        assert_eq!(config.projects.len(), 5);
    }

    #[test]
    fn test_ci_enables_retries_and_caps_workers() {
        let config = SuiteConfig::from_vars(vars(&[("CI", "true")])).unwrap();
        assert!(config.ci);
        assert_eq!(config.retries, 2);
        assert_eq!(config.workers, Some(2));

        let config = SuiteConfig::from_vars(vars(&[("CI", "0")])).unwrap();
        assert!(!config.ci);
    }

    #[test]
    fn test_base_url_override_and_validation() {
        let config =
            SuiteConfig::from_vars(vars(&[("BASE_URL", "https://docs.example.com")])).unwrap();
        assert_eq!(config.base_url.host_str(), Some("docs.example.com"));

        let err = SuiteConfig::from_vars(vars(&[("BASE_URL", "ftp://docs")])).unwrap_err();
        assert!(matches!(err, SmokeError::Config(_)));
    }

    #[test]
    fn test_project_selection_is_case_insensitive_and_rejects_unknown() {
        let config = SuiteConfig::local();
        let selected = config
            .select_projects(&["Mobile-Safari".to_string(), "chromium".to_string()])
            .unwrap();
        let names: Vec<&str> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mobile-safari", "chromium"]);

        assert!(config.select_projects(&["netscape".to_string()]).is_err());
    }

    #[test]
    fn test_session_options_follow_project() {
        let config = SuiteConfig::local();
        let mobile = config.select_projects(&["mobile-chrome".to_string()]).unwrap();
        let options = config.session_options(&mobile[0]);
        assert_eq!(options.viewport, viewports::PIXEL_5);
        assert!(options.user_agent.contains("Pixel 5"));
        assert_eq!(options.base_url, Some(config.base_url.clone()));
    }
}
