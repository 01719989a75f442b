// Tests for page objects, fixtures and discovery

mod common;

use common::*;
use docsmoke_core::constants::{HERO_BUTTONS, MIN_BODY_TEXT_LEN, paths};
use docsmoke_core::discovery::discover_buttons;
use docsmoke_core::expect::{expect_count, expect_nonempty, expect_visible};
use docsmoke_core::helpers::{class_contains, wait_for_page_ready};
use docsmoke_core::{PageObject, SmokeError};
use wiremock::MockServer;

// ============================================================================
// Base Page
// ============================================================================

#[tokio::test]
async fn test_goto_reports_status_and_title() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();

    let response = page.goto(paths::GETTING_STARTED).await.unwrap();

    assert_eq!(response.status, Some(200));
    assert!(response.url.ends_with("/getting-started"));
    assert_eq!(page.title().await.unwrap(), "Getting Started | Acme");
    assert_eq!(
        page.first_heading().inner_text().await.unwrap(),
        "Getting Started"
    );
    assert!(page.body_text().await.unwrap().chars().count() > MIN_BODY_TEXT_LEN);
}

#[tokio::test]
async fn test_screenshot_lands_in_artifact_dir() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let fixtures = fixtures_for(&server, dir.path());
    let page = fixtures.base_page().await.unwrap();
    page.goto(paths::HOME).await.unwrap();

    let path = page.screenshot("home").await.unwrap();

    assert!(path.starts_with(fixtures.artifact_dir()));
    assert!(path.exists());
}

#[tokio::test]
async fn test_page_ready_and_scrolling() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();
    page.goto(paths::HOME).await.unwrap();

    wait_for_page_ready(&page).await.unwrap();
    page.scroll_to("footer").await.unwrap();
    page.scroll_to_bottom().await.unwrap();
    page.expect_visible("footer").await.unwrap();
    page.expect_text("footer", "docs").await.unwrap();
}

// ============================================================================
// Partial Class Locators
// ============================================================================

#[tokio::test]
async fn test_partial_class_matches_generated_suffix() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();
    page.goto(paths::HOME).await.unwrap();

    let buttons = page.locator(&class_contains("primaryBtn"));
    expect_count(&buttons, 1).await.unwrap();

    let each = expect_nonempty(&buttons, "primary button").await.unwrap();
    assert_eq!(each.len(), 1);
    expect_visible(&each[0]).await.unwrap();
}

#[tokio::test]
async fn test_empty_match_is_a_precondition_failure() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();
    page.goto(paths::GETTING_STARTED).await.unwrap();

    let err = expect_nonempty(&page.locator(&class_contains("primaryBtn")), "primary button")
        .await
        .unwrap_err();

    assert!(matches!(err, SmokeError::Precondition(_)));
}

// ============================================================================
// Home Page
// ============================================================================

#[tokio::test]
async fn test_home_page_components() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let home = fixtures_for(&server, dir.path()).home_page().await.unwrap();

    let response = home.open().await.unwrap();
    assert_eq!(response.status, Some(200));
    assert!(home.is_current().await.unwrap());

    assert_eq!(
        home.hero_title().inner_text().await.unwrap(),
        "Acme Documentation"
    );
    assert_eq!(home.primary_button_labels().await.unwrap(), vec!["Get Started"]);
    assert!(home.search_button().is_visible().await.unwrap());
}

#[tokio::test]
async fn test_getting_started_card_navigates() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let home = fixtures_for(&server, dir.path()).home_page().await.unwrap();
    home.open().await.unwrap();

    let response = home.click_getting_started_card().await.unwrap();

    assert_eq!(response.status, Some(200));
    assert!(response.url.ends_with("/getting-started"));
    assert!(!home.is_current().await.unwrap());
}

#[tokio::test]
async fn test_search_submits_query() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let home = fixtures_for(&server, dir.path()).home_page().await.unwrap();
    home.open().await.unwrap();

    home.search("locators").await.unwrap();

    let url = home.base().url().await.unwrap();
    assert!(url.contains("/search?q=locators"), "{}", url);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_navigation_works_from_any_page() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let fixtures = fixtures_for(&server, dir.path());
    let page = fixtures.base_page().await.unwrap();
    let nav = fixtures.navigation().await.unwrap();

    page.goto(paths::HOME).await.unwrap();
    assert!(nav.is_visible().await.unwrap());
    assert_eq!(nav.item_labels().await.unwrap(), vec!["Docs", "Blog"]);

    nav.click_link("Blog").await.unwrap();
    assert!(page.url().await.unwrap().ends_with("/blog"));

    let response = nav.go_home().await.unwrap();
    assert_eq!(response.status, Some(200));
    assert_eq!(response.url, format!("{}/", server.uri()));
}

// ============================================================================
// Fixtures
// ============================================================================

#[tokio::test]
async fn test_fixtures_are_lazy_and_share_one_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let fixtures = fixtures_for(&server, dir.path());

    assert!(fixtures.active_session().is_none());

    let first = fixtures.page().await.unwrap();
    let home = fixtures.home_page().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, home.base().session()));

    fixtures.teardown().await;
    assert!(first.current_url().await.is_err());
}

#[tokio::test]
async fn test_teardown_without_session_is_a_no_op() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let fixtures = fixtures_for(&server, dir.path());

    fixtures.teardown().await;

    assert!(fixtures.active_session().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn test_button_discovery_counts_regions() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();
    page.goto(paths::HOME).await.unwrap();

    let counts = discover_buttons(&page).await.unwrap();

    assert_eq!(counts.get("navbar"), 1);
    assert_eq!(counts.get("hero"), 1);
    assert_eq!(counts.get("main"), 1);
    assert_eq!(counts.get("footer"), 1);
    assert_eq!(counts.total(), 4);
    assert!(counts.empty_regions().is_empty());
}

#[tokio::test]
async fn test_button_wrappers_are_not_counted() {
    let server = healthy_site().await;
    let dir = tempfile::tempdir().unwrap();
    let page = fixtures_for(&server, dir.path()).base_page().await.unwrap();
    page.goto(paths::HOME).await.unwrap();

    let hero = page.locator(HERO_BUTTONS);
    assert_eq!(hero.count().await.unwrap(), 1);
    assert_eq!(hero.inner_text().await.unwrap(), "Get Started");
    assert_eq!(
        page.locator(r#"[class*="hero"] [class*="buttons_"]"#)
            .count()
            .await
            .unwrap(),
        1
    );
}
