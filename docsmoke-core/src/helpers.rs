// Small utilities shared by page objects, the crawler and specs.

use crate::constants::{self, NON_NAVIGATIONAL_PREFIXES, NOT_FOUND_MARKERS};
use crate::crawl::{CrawlReport, LinkCrawler};
use crate::error::Result;
use crate::pages::BasePage;
use tracing::info;
use url::Url;

/// `[class*="X"]`: matches any element whose class attribute contains `X`,
/// so build-time suffixes like `primaryBtn_OCwy` still match `primaryBtn`.
pub fn class_contains(fragment: &str) -> String {
    format!(r#"[class*="{}"]"#, fragment.replace('"', "\\\""))
}

pub fn is_navigational_href(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty()
        && !NON_NAVIGATIONAL_PREFIXES
            .iter()
            .any(|prefix| href.to_ascii_lowercase().starts_with(prefix))
}

pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Resolve `href` against `base`, dropping any fragment.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    if !is_navigational_href(href) {
        return None;
    }
    let mut resolved = base.join(href.trim()).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Case-insensitive search for a not-found marker ("404", "page not found").
pub fn is_not_found_text(text: &str) -> bool {
    let text = text.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| text.contains(marker))
}

pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

/// Wait for the document load and for a body to be attached.
pub async fn wait_for_page_ready(page: &BasePage) -> Result<()> {
    page.wait_for_load().await?;
    page.locator(constants::selectors::BODY)
        .wait_for(page.session().timeouts().action)
        .await?;
    Ok(())
}

/// Site-wide broken link sweep: crawl the internal links of every page in
/// `paths` and fail unless each crawl is healthy.
pub async fn verify_no_broken_links(
    page: &BasePage,
    paths: &[&str],
    limit: usize,
) -> Result<Vec<CrawlReport>> {
    let crawler = LinkCrawler::new(limit);
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let report = crawler
            .crawl(page, path, constants::INTERNAL_LINK_PREFIX)
            .await?;
        info!(
            "Checked {} links from {} ({} broken)",
            report.records.len(),
            path,
            report.broken().count()
        );
        report.assert_healthy(constants::CRAWL_TIMEOUT_TOLERANCE)?;
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_contains_builds_substring_selector() {
        assert_eq!(class_contains("primaryBtn"), r#"[class*="primaryBtn"]"#);
    }

    #[test]
    fn test_non_navigational_hrefs_are_rejected() {
        for href in ["", "#", "#section", "mailto:team@docs.dev", "tel:+1555", "javascript:void(0)"] {
            assert!(!is_navigational_href(href), "{}", href);
        }
        for href in ["/docs", "https://github.com", "guide/intro"] {
            assert!(is_navigational_href(href), "{}", href);
        }
    }

    #[test]
    fn test_same_origin_uses_default_ports() {
        let a = Url::parse("https://docs.dev/a").unwrap();
        let b = Url::parse("https://docs.dev:443/b").unwrap();
        let c = Url::parse("http://docs.dev/a").unwrap();
        assert!(is_same_origin(&a, &b));
        assert!(!is_same_origin(&a, &c));
    }

    #[test]
    fn test_resolve_href_drops_fragment() {
        let base = Url::parse("http://localhost:3000/docs/").unwrap();
        assert_eq!(
            resolve_href(&base, "intro#install").unwrap().as_str(),
            "http://localhost:3000/docs/intro"
        );
        assert!(resolve_href(&base, "#top").is_none());
    }

    #[test]
    fn test_not_found_markers_are_case_insensitive() {
        assert!(is_not_found_text("PAGE NOT FOUND"));
        assert!(is_not_found_text("Error 404 - gone"));
        assert!(!is_not_found_text("Getting Started"));
    }

    #[test]
    fn test_truncation_counts_characters() {
        assert_eq!(truncate_for_log("héllo", 10), "héllo");
        assert_eq!(truncate_for_log("héllo world", 5), "héllo…");
    }
}
