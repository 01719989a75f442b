use crate::constants::selectors;
use crate::error::Result;
use crate::expect;
use docsmoke_browser::{Locator, NavResponse, Session};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Common page operations over one session.
#[derive(Clone)]
pub struct BasePage {
    session: Arc<dyn Session>,
    screenshot_dir: PathBuf,
}

impl BasePage {
    pub fn new(session: Arc<dyn Session>, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            screenshot_dir: screenshot_dir.into(),
        }
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn locator(&self, selector: &str) -> Locator {
        Locator::new(self.session.clone(), selector)
    }

    /// Navigate to a path relative to the base URL (or an absolute URL) and
    /// wait for the load event.
    pub async fn goto(&self, path: &str) -> Result<NavResponse> {
        debug!("goto {}", path);
        let response = self.session.goto(path).await?;
        self.session.wait_for_load().await?;
        Ok(response)
    }

    pub async fn go_back(&self) -> Result<Option<NavResponse>> {
        Ok(self.session.go_back().await?)
    }

    pub async fn wait_for_load(&self) -> Result<()> {
        Ok(self.session.wait_for_load().await?)
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.session.title().await?)
    }

    pub async fn url(&self) -> Result<String> {
        Ok(self.session.current_url().await?)
    }

    pub async fn body_text(&self) -> Result<String> {
        Ok(self.locator(selectors::BODY).inner_text().await?)
    }

    pub fn first_heading(&self) -> Locator {
        self.locator(selectors::FIRST_HEADING).first()
    }

    pub async fn expect_visible(&self, selector: &str) -> Result<()> {
        expect::expect_visible(&self.locator(selector)).await
    }

    pub async fn expect_text(&self, selector: &str, text: &str) -> Result<()> {
        expect::expect_text(&self.locator(selector), text).await
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        Ok(self.locator(selector).click().await?)
    }

    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        Ok(self.locator(selector).fill(value).await?)
    }

    pub async fn scroll_to(&self, selector: &str) -> Result<()> {
        Ok(self.locator(selector).scroll_into_view().await?)
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(self.session.scroll_to_bottom().await?)
    }

    /// Capture the page as `<screenshot dir>/<name>`; the backend picks the
    /// extension.
    pub async fn screenshot(&self, name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.screenshot_dir).await?;
        let path = self.screenshot_dir.join(name);
        Ok(self.session.screenshot(&path).await?)
    }

    /// Fixed sleep. Prefer a locator wait or a web-first assertion.
    pub async fn wait(&self, ms: u64) {
        warn!("Fixed wait of {}ms; prefer waiting on a condition", ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

impl std::fmt::Debug for BasePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePage")
            .field("screenshot_dir", &self.screenshot_dir)
            .finish_non_exhaustive()
    }
}
