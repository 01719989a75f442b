// Mock documentation site shared by the integration tests

#![allow(dead_code)]

use docsmoke_browser::{BrowserKind, Timeouts};
use docsmoke_core::{Fixtures, HttpSessionFactory, Project, SuiteConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const HOME: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Acme Docs | Acme</title></head>
<body>
  <nav class="navbar navbar--fixed-top">
    <div class="navbar__inner">
      <a class="navbar__brand" href="/"><b class="navbar__title">Acme</b></a>
      <a class="navbar__item navbar__link" href="/docs">Docs</a>
      <a class="navbar__item navbar__link" href="/blog">Blog</a>
      <button class="DocSearch DocSearch-Button" aria-label="Search">Search</button>
    </div>
  </nav>
  <header class="hero hero--primary heroBanner_qdFl">
    <h1 class="hero__title">Acme Documentation</h1>
    <p class="hero__subtitle">Everything you need to build with Acme.</p>
    <div class="buttons_AeoN">
      <a class="button button--secondary button--lg primaryBtn_OCwy" href="/getting-started">Get Started</a>
    </div>
  </header>
  <main>
    <section class="features_t9lD">
      <a class="card" href="/getting-started">Getting started guide</a>
      <a class="card" href="/docs/intro">Introduction</a>
      <a href="mailto:team@acme.dev">Contact</a>
    </section>
    <form action="/search" method="get" class="searchForm">
      <input type="search" name="q" class="searchInput_x1">
      <button type="submit">Go</button>
    </form>
  </main>
  <footer class="footer">
    <a class="footer__link-item" href="/docs">Docs</a>
    <button class="button footerBtn">Top</button>
  </footer>
</body>
</html>"#;

const NAVBAR: &str = r#"<nav class="navbar"><a class="navbar__brand" href="/">Acme</a><a class="navbar__item" href="/docs">Docs</a></nav>"#;

/// A content page with a navbar, one heading and enough prose to count as
/// rendered.
pub fn content_page(title: &str, heading: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{title} | Acme</title></head><body>{NAVBAR}\
         <main><h1>{heading}</h1><p>This page walks through installing Acme, configuring \
         a project and deploying the generated site. Each section links to the reference \
         material for the options it mentions.</p></main></body></html>"
    )
}

pub fn not_found_page() -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Page Not Found | Acme</title></head><body>{NAVBAR}\
         <main><h1>Page Not Found</h1><p>We could not find what you were looking for.</p>\
         </main></body></html>"
    )
}

pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.into())
}

pub async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

/// A site where every link on the home page resolves.
pub async fn healthy_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/", html(HOME)).await;
    mount_page(&server, "/docs", html(content_page("Docs", "Documentation"))).await;
    mount_page(&server, "/blog", html(content_page("Blog", "Blog"))).await;
    mount_page(
        &server,
        "/getting-started",
        html(content_page("Getting Started", "Getting Started")),
    )
    .await;
    mount_page(&server, "/docs/intro", html(content_page("Introduction", "Introduction"))).await;
    mount_page(
        &server,
        "/search",
        html(content_page("Search", "Search results")),
    )
    .await;
    server
}

/// `/blog` is a hard 404 and `/docs/intro` a soft one (200 with a
/// not-found page).
pub async fn broken_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/", html(HOME)).await;
    mount_page(&server, "/docs", html(content_page("Docs", "Documentation"))).await;
    mount_page(
        &server,
        "/blog",
        ResponseTemplate::new(404)
            .insert_header("content-type", "text/html")
            .set_body_string(not_found_page()),
    )
    .await;
    mount_page(
        &server,
        "/getting-started",
        html(content_page("Getting Started", "Getting Started")),
    )
    .await;
    mount_page(&server, "/docs/intro", html(not_found_page())).await;
    server
}

pub fn config_for(server: &MockServer, output: &Path) -> SuiteConfig {
    let mut config = SuiteConfig::local()
        .with_base_url(&server.uri())
        .expect("mock server URI is a valid base URL");
    config.timeouts = Timeouts {
        action: Duration::from_millis(500),
        navigation: Duration::from_secs(5),
        expect: Duration::from_millis(500),
    };
    config.test_timeout = Duration::from_secs(10);
    config.output_dir = output.to_path_buf();
    config.projects = vec![Project::desktop("chromium", BrowserKind::Chromium)];
    config
}

pub fn fixtures_for(server: &MockServer, output: &Path) -> Fixtures {
    let config = config_for(server, output);
    let project = config.projects[0].clone();
    Fixtures::new(
        Arc::new(config),
        project,
        Arc::new(HttpSessionFactory),
        output.join("artifacts"),
    )
}
