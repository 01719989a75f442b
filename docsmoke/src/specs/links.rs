// Link health: internal links resolve, external links respond.

use docsmoke_core::constants::{
    EXTERNAL_LINK_LIMIT, EXTERNAL_LINK_PREFIX, INTERNAL_LINK_LIMIT, INTERNAL_LINK_PREFIX, paths,
};
use docsmoke_core::helpers::verify_no_broken_links;
use docsmoke_core::{ExternalPolicy, Fixtures, LinkCrawler, Result, TestCase};

const SUITE: &str = "Links";

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase::new(SUITE, "homepage internal links resolve", internal_links_resolve),
        TestCase::new(SUITE, "homepage external links respond", external_links_respond),
        TestCase::new(SUITE, "no broken links on key pages", no_broken_links_on_key_pages),
    ]
}

async fn internal_links_resolve(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    let crawler = LinkCrawler::new(INTERNAL_LINK_LIMIT);
    let report = crawler
        .crawl(&page, paths::HOME, INTERNAL_LINK_PREFIX)
        .await?;
    report.assert_healthy(crawler.timeout_tolerance())
}

async fn external_links_respond(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    let crawler = LinkCrawler::new(EXTERNAL_LINK_LIMIT).with_external_policy(ExternalPolicy::Check);
    let report = crawler
        .crawl(&page, paths::HOME, EXTERNAL_LINK_PREFIX)
        .await?;
    report.assert_healthy(crawler.timeout_tolerance())
}

async fn no_broken_links_on_key_pages(fixtures: Fixtures) -> Result<()> {
    let page = fixtures.base_page().await?;
    verify_no_broken_links(
        &page,
        &[paths::HOME, paths::GETTING_STARTED],
        INTERNAL_LINK_LIMIT,
    )
    .await?;
    Ok(())
}
