use crate::error::{Result, SessionError};
use crate::query::ElementQuery;
use crate::session::Session;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Deferred reference to zero or more elements.
///
/// Nothing is resolved when the locator is built; every method re-runs the
/// query against the live document. Actions auto-wait up to the session's
/// action timeout for the element to attach.
#[derive(Clone)]
pub struct Locator {
    session: Arc<dyn Session>,
    query: ElementQuery,
}

impl Locator {
    pub fn new(session: Arc<dyn Session>, selector: impl Into<String>) -> Self {
        Self {
            session,
            query: ElementQuery::new(selector),
        }
    }

    pub fn from_query(session: Arc<dyn Session>, query: ElementQuery) -> Self {
        Self { session, query }
    }

    pub fn query(&self) -> &ElementQuery {
        &self.query
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    pub fn nth(&self, index: usize) -> Self {
        Self::from_query(self.session.clone(), self.query.clone().nth(index))
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self::from_query(self.session.clone(), self.query.clone().with_text(text))
    }

    pub async fn count(&self) -> Result<usize> {
        self.session.count(&self.query).await
    }

    /// Poll until at least one element matches.
    pub async fn wait_for(&self, timeout: Duration) -> Result<()> {
        self.poll(timeout, "to be attached", |locator| async move {
            Ok(locator.count().await? > 0)
        })
        .await
    }

    pub async fn click(&self) -> Result<()> {
        self.attach().await?;
        self.session.click(&self.query).await
    }

    pub async fn fill(&self, value: &str) -> Result<()> {
        self.attach().await?;
        self.session.fill(&self.query, value).await
    }

    pub async fn inner_text(&self) -> Result<String> {
        self.attach().await?;
        self.session.inner_text(&self.query).await
    }

    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.attach().await?;
        self.session.attribute(&self.query, name).await
    }

    pub async fn input_value(&self) -> Result<String> {
        self.attach().await?;
        self.session.input_value(&self.query).await
    }

    pub async fn scroll_into_view(&self) -> Result<()> {
        self.attach().await?;
        self.session.scroll_into_view(&self.query).await
    }

    /// Does not wait; false when nothing matches.
    pub async fn is_visible(&self) -> Result<bool> {
        self.session.is_visible(&self.query).await
    }

    async fn attach(&self) -> Result<()> {
        self.wait_for(self.session.timeouts().action).await
    }

    async fn poll<F, Fut>(&self, timeout: Duration, state: &str, mut check: F) -> Result<()>
    where
        F: FnMut(Locator) -> Fut,
        Fut: std::future::Future<Output = Result<bool>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            match check(self.clone()).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                // Errors other than "not there yet" are final.
                Err(SessionError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::Timeout {
                    what: format!("waiting for {} {}", self.query, state),
                    after: timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locator").field("query", &self.query).finish()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}
