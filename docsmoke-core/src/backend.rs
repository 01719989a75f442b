// Session construction per backend.

use crate::config::{Backend, Project, SuiteConfig};
use crate::error::Result;
use async_trait::async_trait;
use docsmoke_browser::{HttpSession, Session, SessionOptions};
use std::sync::Arc;
use tracing::debug;

/// Opens one fresh, isolated session for a project.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, project: &Project, options: SessionOptions) -> Result<Arc<dyn Session>>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpSessionFactory;

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self, project: &Project, options: SessionOptions) -> Result<Arc<dyn Session>> {
        debug!(
            "Opening HTTP session for {} ({}x{})",
            project.name, options.viewport.width, options.viewport.height
        );
        Ok(Arc::new(HttpSession::new(options)?))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(feature = "webdriver")]
#[derive(Debug, Clone)]
pub struct WebDriverSessionFactory {
    endpoint: String,
}

#[cfg(feature = "webdriver")]
impl WebDriverSessionFactory {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(feature = "webdriver")]
#[async_trait]
impl SessionFactory for WebDriverSessionFactory {
    async fn open(&self, project: &Project, options: SessionOptions) -> Result<Arc<dyn Session>> {
        debug!(
            "Opening WebDriver session for {} at {}",
            project.name, self.endpoint
        );
        let session =
            docsmoke_browser::WebDriverSession::connect(&self.endpoint, project.browser, options)
                .await?;
        Ok(Arc::new(session))
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}

/// The factory selected by `config.backend`.
pub fn factory_for(config: &SuiteConfig) -> Result<Arc<dyn SessionFactory>> {
    match config.backend {
        Backend::Http => Ok(Arc::new(HttpSessionFactory)),
        #[cfg(feature = "webdriver")]
        Backend::WebDriver => Ok(Arc::new(WebDriverSessionFactory::new(
            config.webdriver_url.clone(),
        ))),
        #[cfg(not(feature = "webdriver"))]
        Backend::WebDriver => Err(crate::error::SmokeError::Config(
            "the webdriver backend requires building with the `webdriver` feature".to_string(),
        )),
    }
}
