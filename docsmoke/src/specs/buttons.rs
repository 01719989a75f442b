// Button discovery across page regions.

use docsmoke_core::constants::{HERO_BUTTONS, paths};
use docsmoke_core::discovery::discover_buttons;
use docsmoke_core::expect::{expect_gt, expect_nonempty, expect_visible};
use docsmoke_core::{Fixtures, Result, TestCase};
use tracing::info;

const SUITE: &str = "Buttons";

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new(SUITE, "buttons are discoverable on the homepage", buttons_are_discoverable),
        TestCase::new(SUITE, "hero buttons are visible", hero_buttons_are_visible),
    ]
}

async fn buttons_are_discoverable(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    page.goto(paths::HOME).await?;

    let counts = discover_buttons(&page).await?;
    for (region, count) in counts.regions() {
        info!("{}: {} buttons", region, count);
    }
    expect_gt(counts.total(), 0, "buttons discovered on the homepage")
}

async fn hero_buttons_are_visible(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    page.goto(paths::HOME).await?;

    for button in expect_nonempty(&page.locator(HERO_BUTTONS), "hero button").await? {
        button.scroll_into_view().await?;
        expect_visible(&button).await?;
    }
    Ok(())
}
