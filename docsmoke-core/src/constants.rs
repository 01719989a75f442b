// Site paths, viewports and defaults shared by pages, specs and config.

use docsmoke_browser::Viewport;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_OUTPUT_DIR: &str = "test-results";

pub mod paths {
    pub const HOME: &str = "/";
    pub const GETTING_STARTED: &str = "/getting-started";
    pub const DOCS: &str = "/docs";
}

pub mod viewports {
    use super::Viewport;

    pub const DESKTOP: Viewport = Viewport::new(1280, 720);
    pub const TABLET: Viewport = Viewport::new(768, 1024);
    pub const MOBILE: Viewport = Viewport::new(390, 844);
    pub const PIXEL_5: Viewport = Viewport::new(393, 851);
}

pub mod user_agents {
    pub const PIXEL_5: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    pub const IPHONE_12: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
}

pub mod timeouts {
    use super::Duration;

    pub const ACTION: Duration = Duration::from_secs(10);
    pub const NAVIGATION: Duration = Duration::from_secs(30);
    pub const EXPECT: Duration = Duration::from_secs(5);
    pub const TEST: Duration = Duration::from_secs(30);
}

/// Case-insensitive markers of a not-found page.
pub const NOT_FOUND_MARKERS: &[&str] = &["404", "page not found"];

/// hrefs that never navigate.
pub const NON_NAVIGATIONAL_PREFIXES: &[&str] = &["#", "mailto:", "tel:", "javascript:"];

pub const INTERNAL_LINK_PREFIX: &str = "/";
pub const EXTERNAL_LINK_PREFIX: &str = "http";

pub const INTERNAL_LINK_LIMIT: usize = 20;
pub const EXTERNAL_LINK_LIMIT: usize = 15;
/// Transient timeouts/errors tolerated per crawl. Broken links get none.
pub const CRAWL_TIMEOUT_TOLERANCE: usize = 2;

pub const RETRIES_ON_CI: u32 = 2;
pub const WORKERS_ON_CI: usize = 2;

/// Minimum body text for a content page to count as rendered.
pub const MIN_BODY_TEXT_LEN: usize = 100;

pub mod selectors {
    pub const BODY: &str = "body";
    pub const FIRST_HEADING: &str = "h1";
    pub const NAVBAR: &str = r#"nav[class*="navbar"]"#;
    pub const NAVBAR_BRAND: &str = r#"[class*="navbar__brand"]"#;
    pub const NAVBAR_ITEMS: &str = r#"[class*="navbar__item"]"#;
    pub const HERO_TITLE: &str = r#"[class*="hero__title"]"#;
    pub const PRIMARY_BUTTON_CLASS: &str = "primaryBtn";
    pub const GETTING_STARTED_CARD: &str = r#"a[href*="getting-started"]"#;
    pub const SEARCH_BUTTON: &str =
        r#"[class*="DocSearch-Button"], button[aria-label="Search"], [class*="searchButton"]"#;
    pub const SEARCH_INPUT: &str =
        r#"input[type="search"], [class*="DocSearch-Input"], [class*="searchInput"]"#;
}

// Styled buttons are anchors; wrappers like `div.buttons_AeoN` must not count.
pub const NAVBAR_BUTTONS: &str =
    r#"nav[class*="navbar"] button, nav[class*="navbar"] a[class*="button"]"#;
pub const HERO_BUTTONS: &str = r#"[class*="hero"] button, [class*="hero"] a[class*="button"]"#;
pub const MAIN_BUTTONS: &str = r#"main button, main a[class*="button"]"#;
pub const FOOTER_BUTTONS: &str = r#"footer button, footer a[class*="button"]"#;

/// Page regions scanned by button discovery, as (name, selector).
pub const BUTTON_REGIONS: &[(&str, &str)] = &[
    ("navbar", NAVBAR_BUTTONS),
    ("hero", HERO_BUTTONS),
    ("main", MAIN_BUTTONS),
    ("footer", FOOTER_BUTTONS),
];

/// Longest link text or error detail written to the log.
pub const LOG_TEXT_LIMIT: usize = 120;
