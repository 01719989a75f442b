// Breadth-one link crawler. Each link is visited from the origin page.

use crate::constants;
use crate::error::{Result, SmokeError};
use crate::expect::expect_count_gt_zero;
use crate::helpers::{
    is_navigational_href, is_not_found_text, is_same_origin, resolve_href, truncate_for_log,
};
use crate::model::{LinkRecord, LinkStatus};
use crate::pages::BasePage;
use docsmoke_browser::Locator;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// What to do with links that leave the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalPolicy {
    /// Record them as skipped without any request.
    #[default]
    Skip,
    /// Fetch them with a plain GET and classify the status.
    Check,
}

impl std::str::FromStr for ExternalPolicy {
    type Err = SmokeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(ExternalPolicy::Skip),
            "check" => Ok(ExternalPolicy::Check),
            other => Err(SmokeError::Config(format!(
                "unknown external link policy '{}'",
                other
            ))),
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// An anchor found on the origin page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub display_text: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub origin: String,
    pub records: Vec<LinkRecord>,
}

impl CrawlReport {
    pub fn count(&self, status: LinkStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn broken(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records
            .iter()
            .filter(|r| r.status == LinkStatus::Broken)
    }

    /// Timeouts and errors.
    pub fn failures(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records
            .iter()
            .filter(|r| r.status.is_transient_failure())
    }

    /// No broken link, and at most `tolerance` timeouts/errors.
    pub fn assert_healthy(&self, tolerance: usize) -> Result<()> {
        let broken: Vec<String> = self
            .broken()
            .map(|r| match r.http_status {
                Some(status) => format!("{} ({})", r.href, status),
                None => r.href.clone(),
            })
            .collect();
        if !broken.is_empty() {
            return Err(SmokeError::assertion(
                format!("broken links on {}", self.origin),
                0,
                broken.join(", "),
            ));
        }

        let failures = self.failures().count();
        if failures > tolerance {
            let detail: Vec<String> = self
                .failures()
                .map(|r| format!("{} [{}]", r.href, r.status))
                .collect();
            return Err(SmokeError::assertion(
                format!("timed out or failed links on {}", self.origin),
                format!("<= {}", tolerance),
                format!("{}: {}", failures, detail.join(", ")),
            ));
        }
        Ok(())
    }
}

pub struct LinkCrawler {
    limit: usize,
    external: ExternalPolicy,
    timeout_tolerance: usize,
    client: Option<Client>,
    progress: Option<CrawlProgressCallback>,
}

impl LinkCrawler {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            external: ExternalPolicy::Skip,
            timeout_tolerance: constants::CRAWL_TIMEOUT_TOLERANCE,
            client: None,
            progress: None,
        }
    }

    pub fn with_external_policy(mut self, policy: ExternalPolicy) -> Self {
        self.external = policy;
        self
    }

    pub fn with_timeout_tolerance(mut self, tolerance: usize) -> Self {
        self.timeout_tolerance = tolerance;
        self
    }

    /// Client used for external checks. Defaults to one built from the
    /// session's navigation timeout.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_progress_callback(mut self, callback: CrawlProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn timeout_tolerance(&self) -> usize {
        self.timeout_tolerance
    }

    /// Anchors on the current page whose href starts with `prefix`, up to
    /// the limit. Duplicate and non-navigational hrefs are dropped. Fails
    /// with a precondition error when the page has no such anchor at all.
    pub async fn collect_links(&self, page: &BasePage, prefix: &str) -> Result<Vec<LinkCandidate>> {
        let anchors = page.locator(&href_prefix_selector(prefix));
        let count = expect_count_gt_zero(&anchors, &format!("link with href^=\"{}\"", prefix)).await?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for index in 0..count {
            if candidates.len() >= self.limit {
                break;
            }
            let anchor = anchors.nth(index);
            let Some(href) = anchor.get_attribute("href").await? else {
                continue;
            };
            let href = href.trim().to_string();
            if !is_navigational_href(&href) || !seen.insert(href.clone()) {
                continue;
            }
            let display_text = match anchor.inner_text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!(
                        "No text for link {}: {}",
                        href,
                        truncate_for_log(&e.to_string(), constants::LOG_TEXT_LIMIT)
                    );
                    String::new()
                }
            };
            candidates.push(LinkCandidate { display_text, href });
        }

        debug!(
            "Collected {} of {} links with prefix {}",
            candidates.len(),
            count,
            prefix
        );
        Ok(candidates)
    }

    /// Open `start_path`, then visit each candidate link and classify it.
    /// Per-link failures are recorded. The crawl aborts only when the origin
    /// fails to load, or cannot be reloaded twice in a row.
    pub async fn crawl(&self, page: &BasePage, start_path: &str, prefix: &str) -> Result<CrawlReport> {
        let response = page.goto(start_path).await?;
        if !response.ok() {
            return Err(SmokeError::assertion(
                format!("crawl origin {} to load", start_path),
                "status 200-399",
                response
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "no status".to_string()),
            ));
        }
        let origin = Url::parse(&response.url).map_err(|e| {
            SmokeError::Config(format!("crawl origin {} is not a URL: {}", response.url, e))
        })?;

        let candidates = self.collect_links(page, prefix).await?;
        let total = candidates.len();
        let mut records = Vec::with_capacity(total);
        let mut off_origin = false;

        for (index, candidate) in candidates.into_iter().enumerate() {
            // Second chance to get back after a failed return. Every candidate
            // must start from the origin page.
            if off_origin {
                self.return_to_origin(page, &origin).await?;
                off_origin = false;
            }
            self.report_progress(format!(
                "[{}/{}] {}",
                index + 1,
                total,
                candidate.href
            ));

            let Some(target) = resolve_href(&origin, &candidate.href) else {
                continue;
            };

            let record = if is_same_origin(&origin, &target) {
                let record = self.visit_internal(page, &candidate, &target).await;
                if let Err(e) = self.return_to_origin(page, &origin).await {
                    warn!("Could not return to {} after {}: {}", origin, candidate.href, e);
                    off_origin = true;
                }
                record
            } else {
                match self.external {
                    ExternalPolicy::Skip => LinkRecord::new(
                        &candidate.display_text,
                        &candidate.href,
                        LinkStatus::ExternalSkipped,
                    ),
                    ExternalPolicy::Check => {
                        let timeout = page.session().timeouts().navigation;
                        self.check_external(&candidate, &target, timeout).await
                    }
                }
            };

            if record.status == LinkStatus::Broken {
                warn!(
                    "Broken link on {}: {} -> {:?}",
                    origin, record.href, record.http_status
                );
            }
            records.push(record);
        }

        let report = CrawlReport {
            origin: origin.to_string(),
            records,
        };
        info!(
            "Crawled {} links from {}: {} ok, {} broken, {} skipped, {} failed",
            report.records.len(),
            report.origin,
            report.count(LinkStatus::Ok),
            report.count(LinkStatus::Broken),
            report.count(LinkStatus::ExternalSkipped),
            report.failures().count()
        );
        Ok(report)
    }

    async fn visit_internal(&self, page: &BasePage, candidate: &LinkCandidate, target: &Url) -> LinkRecord {
        match self.follow(page, candidate, target).await {
            Ok((status, text)) => {
                let broken = status.is_some_and(|s| s >= 400) || is_not_found_text(&text);
                let record = LinkRecord::new(
                    &candidate.display_text,
                    &candidate.href,
                    if broken { LinkStatus::Broken } else { LinkStatus::Ok },
                )
                .with_http_status(status);
                if broken && is_not_found_text(&text) {
                    record.with_detail("page reads as not found")
                } else {
                    record
                }
            }
            Err(e) => failed_record(candidate, &e),
        }
    }

    async fn return_to_origin(&self, page: &BasePage, origin: &Url) -> Result<()> {
        if page.url().await.is_ok_and(|url| url == origin.as_str()) {
            return Ok(());
        }
        page.goto(origin.as_str()).await?;
        Ok(())
    }

    /// Click the anchor (or navigate to it if it cannot be clicked) and
    /// return the landing page's status and text.
    async fn follow(
        &self,
        page: &BasePage,
        candidate: &LinkCandidate,
        target: &Url,
    ) -> Result<(Option<u16>, String)> {
        let anchor: Locator = page
            .locator(&format!(r#"a[href="{}"]"#, candidate.href.replace('"', "\\\"")))
            .first();

        if anchor.is_visible().await? {
            anchor.click().await?;
        } else {
            debug!("{} is not visible, navigating directly", candidate.href);
            page.session().goto(target.as_str()).await?;
        }
        page.wait_for_load().await?;

        let status = page.session().status().await?;
        let text = page.body_text().await?;
        Ok((status, text))
    }

    async fn check_external(&self, candidate: &LinkCandidate, target: &Url, timeout: Duration) -> LinkRecord {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => match default_client(timeout) {
                Ok(client) => client,
                Err(e) => return failed_record(candidate, &e),
            },
        };

        match client.get(target.clone()).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                LinkRecord::new(
                    &candidate.display_text,
                    &candidate.href,
                    classify_status(status),
                )
                .with_http_status(Some(status))
            }
            Err(e) => failed_record(candidate, &SmokeError::HttpError(e)),
        }
    }

    fn report_progress(&self, message: String) {
        if let Some(callback) = &self.progress {
            callback(message);
        }
    }
}

/// Redirects are followed before classification, so anything in
/// `[200, 400)` passes.
pub fn classify_status(status: u16) -> LinkStatus {
    if status >= 400 {
        LinkStatus::Broken
    } else {
        LinkStatus::Ok
    }
}

fn href_prefix_selector(prefix: &str) -> String {
    format!(r#"a[href^="{}"]"#, prefix.replace('"', "\\\""))
}

fn failed_record(candidate: &LinkCandidate, error: &SmokeError) -> LinkRecord {
    let status = if error.is_timeout() {
        LinkStatus::Timeout
    } else {
        LinkStatus::Error
    };
    debug!(
        "{} ({}) failed: {}",
        candidate.href,
        truncate_for_log(&candidate.display_text, constants::LOG_TEXT_LIMIT),
        truncate_for_log(&error.to_string(), constants::LOG_TEXT_LIMIT)
    );
    LinkRecord::new(&candidate.display_text, &candidate.href, status).with_detail(error.to_string())
}

fn default_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(format!("docsmoke/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: LinkStatus) -> LinkRecord {
        LinkRecord::new("x", "/x", status)
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(200), LinkStatus::Ok);
        assert_eq!(classify_status(301), LinkStatus::Ok);
        assert_eq!(classify_status(399), LinkStatus::Ok);
        assert_eq!(classify_status(400), LinkStatus::Broken);
        assert_eq!(classify_status(503), LinkStatus::Broken);
    }

    #[test]
    fn test_external_policy_parses() {
        assert_eq!("check".parse::<ExternalPolicy>().unwrap(), ExternalPolicy::Check);
        assert_eq!("SKIP".parse::<ExternalPolicy>().unwrap(), ExternalPolicy::Skip);
        assert!("follow".parse::<ExternalPolicy>().is_err());
    }

    #[test]
    fn test_healthy_report_tolerates_few_timeouts() {
        let report = CrawlReport {
            origin: "http://docs.local/".to_string(),
            records: vec![
                record(LinkStatus::Ok),
                record(LinkStatus::ExternalSkipped),
                record(LinkStatus::Timeout),
                record(LinkStatus::Error),
            ],
        };
        assert!(report.assert_healthy(2).is_ok());
        assert!(report.assert_healthy(1).is_err());
    }

    #[test]
    fn test_any_broken_link_is_unhealthy() {
        let report = CrawlReport {
            origin: "http://docs.local/".to_string(),
            records: vec![
                record(LinkStatus::Ok),
                record(LinkStatus::Broken).with_http_status(Some(404)),
            ],
        };
        let err = report.assert_healthy(10).unwrap_err();
        assert!(err.to_string().contains("/x (404)"));
    }
}
