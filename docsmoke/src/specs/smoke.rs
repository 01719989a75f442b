// Core pages load and render their main components.

use docsmoke_core::constants::{MIN_BODY_TEXT_LEN, paths};
use docsmoke_core::expect::{
    expect_gt, expect_nonempty, expect_not_not_found, expect_status, expect_true, expect_visible,
};
use docsmoke_core::{Fixtures, PageObject, Result, TestCase};

const SUITE: &str = "Smoke";

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new(SUITE, "homepage loads", homepage_loads),
        TestCase::new(SUITE, "getting started page renders", getting_started_renders),
        TestCase::new(SUITE, "navigation header is present", navigation_is_present),
        TestCase::new(SUITE, "primary buttons are visible", primary_buttons_are_visible),
    ]
}

async fn homepage_loads(fixtures: Fixtures) -> Result<()> {
    let home = fixtures.home_page().await?;
    let response = home.open().await?;
    expect_status(&response, 200)?;

    let title = home.base().title().await?;
    expect_gt(title.trim().len(), 0, "homepage title length")
}

async fn getting_started_renders(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    let response = page.goto(paths::GETTING_STARTED).await?;
    expect_status(&response, 200)?;

    let body = page.body_text().await?;
    expect_gt(body.chars().count(), MIN_BODY_TEXT_LEN, "getting started body text length")?;

    expect_not_not_found(&page.title().await?, "title")?;
    let heading = page.first_heading();
    if heading.count().await? > 0 {
        expect_not_not_found(&heading.inner_text().await?, "first heading")?;
    }
    Ok(())
}

async fn navigation_is_present(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    let nav = fixtures.navigation().await?;
    page.goto(paths::HOME).await?;

    expect_visible(&nav.header()).await?;
    expect_visible(&nav.brand()).await?;
    let labels = nav.item_labels().await?;
    expect_true(!labels.is_empty(), "navbar items have labels")
}

async fn primary_buttons_are_visible(fixtures: Fixtures) -> Result<()> {
    let home = fixtures.home_page().await?;
    home.open().await?;

    for button in expect_nonempty(&home.primary_buttons(), "primary button").await? {
        expect_visible(&button).await?;
        let label = button.inner_text().await?;
        expect_true(!label.trim().is_empty(), "primary button has a label")?;
    }
    Ok(())
}
