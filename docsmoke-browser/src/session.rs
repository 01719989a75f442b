use crate::error::Result;
use crate::query::ElementQuery;
use crate::trace::TraceEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Outcome of a top-level navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavResponse {
    /// HTTP status of the main document, when the backend can observe it.
    pub status: Option<u16>,
    /// Final URL after redirects.
    pub url: String,
}

impl NavResponse {
    pub fn ok(&self) -> bool {
        matches!(self.status, Some(200..=399))
    }
}

/// Browser engine a project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Auto-wait budget for element actions (click, fill, text reads).
    pub action: Duration,
    /// Budget for a top-level navigation.
    pub navigation: Duration,
    /// Polling budget for web-first assertions.
    pub expect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action: Duration::from_secs(10),
            navigation: Duration::from_secs(30),
            expect: Duration::from_secs(5),
        }
    }
}

/// Everything a backend needs to open one isolated session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Origin relative paths are resolved against.
    pub base_url: Option<Url>,
    pub user_agent: String,
    pub viewport: Viewport,
    pub timeouts: Timeouts,
    /// Ignored by backends without a visible window.
    pub headed: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: format!("docsmoke/{}", env!("CARGO_PKG_VERSION")),
            viewport: Viewport::default(),
            timeouts: Timeouts::default(),
            headed: false,
        }
    }
}

/// One isolated browser tab.
///
/// Element operations take an [`ElementQuery`] and resolve it against the
/// current document each time they are called; nothing is cached between
/// calls. Operations that act on a single element are strict unless the
/// query carries an index.
#[async_trait]
pub trait Session: Send + Sync {
    fn timeouts(&self) -> Timeouts;

    /// Navigate to an absolute URL or a path relative to the base URL and
    /// wait for the document to load.
    async fn goto(&self, url: &str) -> Result<NavResponse>;

    /// Return to the previous history entry, if any.
    async fn go_back(&self) -> Result<Option<NavResponse>>;

    async fn wait_for_load(&self) -> Result<()>;

    async fn title(&self) -> Result<String>;

    async fn current_url(&self) -> Result<String>;

    /// HTTP status of the document currently loaded, when observable.
    async fn status(&self) -> Result<Option<u16>>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    async fn count(&self, query: &ElementQuery) -> Result<usize>;

    /// Rendered text of the element, whitespace-collapsed.
    async fn inner_text(&self, query: &ElementQuery) -> Result<String>;

    async fn attribute(&self, query: &ElementQuery, name: &str) -> Result<Option<String>>;

    async fn is_visible(&self, query: &ElementQuery) -> Result<bool>;

    async fn click(&self, query: &ElementQuery) -> Result<()>;

    async fn fill(&self, query: &ElementQuery, value: &str) -> Result<()>;

    async fn input_value(&self, query: &ElementQuery) -> Result<String>;

    async fn scroll_into_view(&self, query: &ElementQuery) -> Result<()>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Capture the current page to `path`. Returns the path actually written,
    /// which may carry a backend-specific extension.
    async fn screenshot(&self, path: &Path) -> Result<PathBuf>;

    /// Actions performed so far, oldest first.
    fn trace(&self) -> Vec<TraceEntry>;

    async fn close(&self) -> Result<()>;
}
