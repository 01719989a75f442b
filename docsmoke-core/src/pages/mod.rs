mod base;
mod home;
mod navigation;

pub use base::BasePage;
pub use home::HomePage;
pub use navigation::Navigation;

use crate::error::Result;
use async_trait::async_trait;
use docsmoke_browser::NavResponse;

/// A page reachable at a fixed path, driven through a [`BasePage`].
#[async_trait]
pub trait PageObject: Send + Sync {
    fn base(&self) -> &BasePage;

    fn path(&self) -> &str;

    async fn open(&self) -> Result<NavResponse> {
        self.base().goto(self.path()).await
    }

    /// Whether the session is currently on this page's path.
    async fn is_current(&self) -> Result<bool> {
        let url = self.base().url().await?;
        let path = url::Url::parse(&url)
            .map(|u| u.path().to_string())
            .unwrap_or(url);
        Ok(path.trim_end_matches('/') == self.path().trim_end_matches('/'))
    }
}
