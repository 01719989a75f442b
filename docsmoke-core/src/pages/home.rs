use super::{BasePage, PageObject};
use crate::constants::{paths, selectors};
use crate::error::Result;
use crate::expect::expect_nonempty;
use crate::helpers::class_contains;
use async_trait::async_trait;
use docsmoke_browser::{Locator, NavResponse};

/// The landing page: hero, call-to-action buttons, feature cards, search.
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
}

impl HomePage {
    pub fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub fn hero_title(&self) -> Locator {
        self.base.locator(selectors::HERO_TITLE)
    }

    /// Every element whose class contains `primaryBtn`, whatever the
    /// generated suffix.
    pub fn primary_buttons(&self) -> Locator {
        self.base
            .locator(&class_contains(selectors::PRIMARY_BUTTON_CLASS))
    }

    pub fn getting_started_card(&self) -> Locator {
        self.base.locator(selectors::GETTING_STARTED_CARD).first()
    }

    pub fn search_button(&self) -> Locator {
        self.base.locator(selectors::SEARCH_BUTTON).first()
    }

    pub fn search_input(&self) -> Locator {
        self.base.locator(selectors::SEARCH_INPUT).first()
    }

    pub async fn open_search(&self) -> Result<()> {
        Ok(self.search_button().click().await?)
    }

    /// Type a query into the search input and submit its form.
    pub async fn search(&self, query: &str) -> Result<()> {
        let input = self.search_input();
        if !input.is_visible().await? {
            self.open_search().await?;
        }
        input.fill(query).await?;
        let submit = self
            .base
            .locator(r#"form button[type="submit"], form input[type="submit"]"#)
            .first();
        Ok(submit.click().await?)
    }

    pub async fn click_getting_started_card(&self) -> Result<NavResponse> {
        self.getting_started_card().click().await?;
        self.base.wait_for_load().await?;
        let session = self.base.session();
        Ok(NavResponse {
            status: session.status().await?,
            url: session.current_url().await?,
        })
    }

    /// Trimmed labels of the primary buttons. At least one button must
    /// exist.
    pub async fn primary_button_labels(&self) -> Result<Vec<String>> {
        let mut labels = Vec::new();
        for button in expect_nonempty(&self.primary_buttons(), "primary button").await? {
            labels.push(button.inner_text().await?.trim().to_string());
        }
        Ok(labels)
    }
}

#[async_trait]
impl PageObject for HomePage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn path(&self) -> &str {
        paths::HOME
    }
}
