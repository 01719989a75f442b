use super::BasePage;
use crate::constants::{paths, selectors};
use crate::error::Result;
use crate::expect::expect_nonempty;
use docsmoke_browser::{Locator, NavResponse};

/// The site header. Not tied to any page; works on whatever page the
/// session is showing.
#[derive(Debug, Clone)]
pub struct Navigation {
    base: BasePage,
}

impl Navigation {
    pub fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub fn header(&self) -> Locator {
        self.base.locator(selectors::NAVBAR).first()
    }

    pub fn brand(&self) -> Locator {
        self.base.locator(selectors::NAVBAR_BRAND).first()
    }

    pub fn items(&self) -> Locator {
        self.base.locator(selectors::NAVBAR_ITEMS)
    }

    /// First header link whose text contains `text`.
    pub fn link(&self, text: &str) -> Locator {
        self.base
            .locator(&format!("{} a", selectors::NAVBAR))
            .with_text(text)
            .first()
    }

    pub async fn click_link(&self, text: &str) -> Result<()> {
        self.link(text).click().await?;
        self.base.wait_for_load().await
    }

    /// Follow the brand link back to the landing page.
    pub async fn go_home(&self) -> Result<NavResponse> {
        let brand = self.brand();
        if brand.count().await? > 0 && brand.get_attribute("href").await?.is_some() {
            brand.click().await?;
            self.base.wait_for_load().await?;
            let session = self.base.session();
            return Ok(NavResponse {
                status: session.status().await?,
                url: session.current_url().await?,
            });
        }
        self.base.goto(paths::HOME).await
    }

    pub async fn item_labels(&self) -> Result<Vec<String>> {
        let mut labels = Vec::new();
        for item in expect_nonempty(&self.items(), "navbar item").await? {
            let label = item.inner_text().await?.trim().to_string();
            if !label.is_empty() {
                labels.push(label);
            }
        }
        Ok(labels)
    }

    pub async fn is_visible(&self) -> Result<bool> {
        Ok(self.header().is_visible().await?)
    }
}
