use crate::backend::SessionFactory;
use crate::config::{Project, SuiteConfig};
use crate::error::Result;
use crate::pages::{BasePage, HomePage, Navigation};
use docsmoke_browser::Session;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Fixtures {
    inner: Arc<FixtureState>,
}

struct FixtureState {
    config: Arc<SuiteConfig>,
    project: Project,
    factory: Arc<dyn SessionFactory>,
    artifact_dir: PathBuf,
    session: OnceCell<Arc<dyn Session>>,
}

impl Fixtures {
    pub fn new(
        config: Arc<SuiteConfig>,
        project: Project,
        factory: Arc<dyn SessionFactory>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(FixtureState {
                config,
                project,
                factory,
                artifact_dir: artifact_dir.into(),
                session: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.inner.config
    }

    pub fn project(&self) -> &Project {
        &self.inner.project
    }

    /// Directory for this attempt's screenshots and traces.
    pub fn artifact_dir(&self) -> &Path {
        &self.inner.artifact_dir
    }

    /// The session, opened on first use.
    pub async fn page(&self) -> Result<Arc<dyn Session>> {
        let state = &self.inner;
        let session = state
            .session
            .get_or_try_init(|| async {
                let options = state.config.session_options(&state.project);
                debug!("Opening session for project {}", state.project.name);
                state.factory.open(&state.project, options).await
            })
            .await?;
        Ok(session.clone())
    }

    pub async fn base_page(&self) -> Result<BasePage> {
        Ok(BasePage::new(self.page().await?, self.artifact_dir()))
    }

    pub async fn home_page(&self) -> Result<HomePage> {
        Ok(HomePage::new(self.base_page().await?))
    }

    pub async fn navigation(&self) -> Result<Navigation> {
        Ok(Navigation::new(self.base_page().await?))
    }

    /// The session if one was opened; never opens one.
    pub fn active_session(&self) -> Option<Arc<dyn Session>> {
        self.inner.session.get().cloned()
    }

    pub async fn teardown(&self) {
        if let Some(session) = self.active_session()
            && let Err(e) = session.close().await
        {
            warn!("Failed to close session: {}", e);
        }
    }
}

impl std::fmt::Debug for Fixtures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fixtures")
            .field("project", &self.inner.project.name)
            .field("artifact_dir", &self.inner.artifact_dir)
            .field("session_open", &self.inner.session.initialized())
            .finish()
    }
}
