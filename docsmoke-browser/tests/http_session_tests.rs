// Tests for the static-DOM session backend

use docsmoke_browser::{
    ElementQuery, HttpSession, Locator, Session, SessionError, SessionOptions, Timeouts,
};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const HOME: &str = r##"<!DOCTYPE html>
<html>
<head><title>Acme Docs</title><script>window.x = 1;</script></head>
<body>
  <nav class="navbar navbar--fixed-top">
    <a class="navbar__brand" href="/">Acme</a>
    <a class="navbar__item navbar__link" href="/docs">Docs</a>
    <a class="navbar__item navbar__link" href="/blog">Blog</a>
  </nav>
  <header class="hero_aEcG">
    <h1 class="hero__title">Acme Documentation</h1>
    <a class="button button--primary primaryBtn_OCwy" href="/getting-started">Get Started</a>
  </header>
  <form action="/search" method="get">
    <input name="q" type="search" class="searchInput_x1">
    <button type="submit">Search</button>
  </form>
  <a href="#features">Jump</a>
  <div style="display:none"><a class="ghost" href="/hidden">Hidden</a></div>
  <button disabled class="disabledBtn">Nope</button>
</body>
</html>"##;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(body.to_string())
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/getting-started"))
        .respond_with(html(
            "<html><head><title>Getting Started</title></head><body><h1>Getting Started</h1></body></html>",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "locators"))
        .respond_with(html(
            "<html><head><title>Search results</title></head><body>3 results</body></html>",
        ))
        .mount(&server)
        .await;

    server
}

fn session_for(server: &MockServer) -> HttpSession {
    let options = SessionOptions {
        base_url: Some(Url::parse(&server.uri()).unwrap()),
        timeouts: Timeouts {
            action: Duration::from_millis(300),
            navigation: Duration::from_secs(5),
            expect: Duration::from_millis(300),
        },
        ..SessionOptions::default()
    };
    HttpSession::new(options).unwrap()
}

#[tokio::test]
async fn test_goto_relative_path_reports_status_and_title() {
    let server = mock_site().await;
    let session = session_for(&server);

    let response = session.goto("/").await.unwrap();
    assert_eq!(response.status, Some(200));
    assert!(response.ok());
    assert_eq!(session.title().await.unwrap(), "Acme Docs");
    assert_eq!(
        session.current_url().await.unwrap(),
        format!("{}/", server.uri())
    );
}

#[tokio::test]
async fn test_missing_page_reports_404_status() {
    let server = mock_site().await;
    let session = session_for(&server);

    let response = session.goto("/nope").await.unwrap();
    assert_eq!(response.status, Some(404));
    assert!(!response.ok());
}

#[tokio::test]
async fn test_queries_before_navigation_fail_with_no_page() {
    let session = HttpSession::new(SessionOptions::default()).unwrap();
    let err = session.title().await.unwrap_err();
    assert!(matches!(err, SessionError::NoPage));

    let err = session.goto("/relative").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_relative_goto_resolves_against_base_not_current_page() {
    let server = mock_site().await;
    let session = session_for(&server);

    session.goto("/docs/intro").await.unwrap();
    let response = session.goto("getting-started").await.unwrap();

    assert_eq!(response.url, format!("{}/getting-started", server.uri()));
    assert_eq!(response.status, Some(200));
}

#[tokio::test]
async fn test_relative_goto_without_base_uses_current_page() {
    let server = mock_site().await;
    let session = HttpSession::new(SessionOptions::default()).unwrap();

    session
        .goto(&format!("{}/docs/intro", server.uri()))
        .await
        .unwrap();
    let response = session.goto("/getting-started").await.unwrap();

    assert_eq!(response.url, format!("{}/getting-started", server.uri()));
    assert_eq!(session.title().await.unwrap(), "Getting Started");
}

#[tokio::test]
async fn test_partial_class_locator_matches_mangled_class() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let buttons = Locator::new(session.clone(), r#"[class*="primaryBtn"]"#);
    assert_eq!(buttons.count().await.unwrap(), 1);
    assert!(buttons.is_visible().await.unwrap());
    assert_eq!(buttons.inner_text().await.unwrap(), "Get Started");
}

#[tokio::test]
async fn test_click_link_navigates_and_go_back_returns() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    Locator::new(session.clone(), r#"[class*="primaryBtn"]"#)
        .click()
        .await
        .unwrap();
    assert!(session.current_url().await.unwrap().ends_with("/getting-started"));
    assert_eq!(session.title().await.unwrap(), "Getting Started");

    let back = session.go_back().await.unwrap().unwrap();
    assert_eq!(back.status, Some(200));
    assert_eq!(session.title().await.unwrap(), "Acme Docs");
}

#[tokio::test]
async fn test_fragment_click_does_not_fetch() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    Locator::new(session.clone(), "a")
        .with_text("Jump")
        .click()
        .await
        .unwrap();
    assert!(session.current_url().await.unwrap().ends_with("/#features"));
    assert_eq!(session.title().await.unwrap(), "Acme Docs");
}

#[tokio::test]
async fn test_strict_mode_violation_on_ambiguous_action() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let items = Locator::new(session.clone(), r#"[class*="navbar__item"]"#);
    let err = items.click().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::StrictModeViolation { count: 2, .. }
    ));

    assert_eq!(items.nth(1).inner_text().await.unwrap(), "Blog");
}

#[tokio::test]
async fn test_hidden_and_disabled_elements_are_not_interactable() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let ghost = Locator::new(session.clone(), "a.ghost");
    assert_eq!(ghost.count().await.unwrap(), 1);
    assert!(!ghost.is_visible().await.unwrap());
    assert!(matches!(
        ghost.click().await.unwrap_err(),
        SessionError::NotInteractable { .. }
    ));

    let disabled = Locator::new(session.clone(), ".disabledBtn");
    assert!(matches!(
        disabled.click().await.unwrap_err(),
        SessionError::NotInteractable { .. }
    ));
}

#[tokio::test]
async fn test_action_on_missing_element_times_out() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let err = Locator::new(session.clone(), ".does-not-exist")
        .click()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_fill_and_submit_form() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let input = Locator::new(session.clone(), r#"input[name="q"]"#);
    input.fill("locators").await.unwrap();
    assert_eq!(input.input_value().await.unwrap(), "locators");

    Locator::new(session.clone(), "button")
        .with_text("Search")
        .click()
        .await
        .unwrap();
    assert_eq!(session.title().await.unwrap(), "Search results");
}

#[tokio::test]
async fn test_fill_rejects_non_editable_elements() {
    let server = mock_site().await;
    let session: Arc<dyn Session> = Arc::new(session_for(&server));
    session.goto("/").await.unwrap();

    let err = session
        .fill(&ElementQuery::new(".hero__title"), "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotInteractable { .. }));
}

#[tokio::test]
async fn test_scroll_target_follows_scrolls_and_resets_on_navigation() {
    let server = mock_site().await;
    let session = session_for(&server);
    session.goto("/").await.unwrap();
    assert_eq!(session.scroll_target(), None);

    session
        .scroll_into_view(&ElementQuery::new(".hero__title"))
        .await
        .unwrap();
    assert_eq!(session.scroll_target().as_deref(), Some(".hero__title"));

    session.scroll_to_bottom().await.unwrap();
    assert_eq!(session.scroll_target().as_deref(), Some("body"));

    session.goto("/getting-started").await.unwrap();
    assert_eq!(session.scroll_target(), None);
}

#[tokio::test]
async fn test_body_text_excludes_script_contents() {
    let server = mock_site().await;
    let session = session_for(&server);
    session.goto("/").await.unwrap();

    let text = session.inner_text(&ElementQuery::new("body")).await.unwrap();
    assert!(text.contains("Acme Documentation"));
    assert!(!text.contains("window.x"));
}

#[tokio::test]
async fn test_screenshot_writes_dom_snapshot_and_trace_records_actions() {
    let server = mock_site().await;
    let session = session_for(&server);
    session.goto("/").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = session
        .screenshot(&dir.path().join("home.png"))
        .await
        .unwrap();
    assert_eq!(written.extension().and_then(|e| e.to_str()), Some("html"));
    let snapshot = std::fs::read_to_string(&written).unwrap();
    assert!(snapshot.contains("Acme Documentation"));

    let trace = session.trace();
    let actions: Vec<&str> = trace.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["goto", "screenshot"]);
}
