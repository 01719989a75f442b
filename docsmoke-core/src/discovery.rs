// Element discovery across page regions.

use crate::constants::BUTTON_REGIONS;
use crate::error::Result;
use crate::model::DiscoveryCounts;
use crate::pages::BasePage;
use tracing::debug;

/// Count the elements matching each `(region, selector)` pair on the
/// current page. Regions with no match are recorded as zero.
pub async fn discover(page: &BasePage, regions: &[(&str, &str)]) -> Result<DiscoveryCounts> {
    let mut counts = DiscoveryCounts::new();
    for (region, selector) in regions {
        let count = page.locator(selector).count().await?;
        debug!("Discovered {} elements in {}", count, region);
        counts.insert(*region, count);
    }
    Ok(counts)
}

/// Buttons in the navbar, hero, main content and footer.
pub async fn discover_buttons(page: &BasePage) -> Result<DiscoveryCounts> {
    discover(page, BUTTON_REGIONS).await
}
