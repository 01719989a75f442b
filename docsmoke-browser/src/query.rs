use serde::{Deserialize, Serialize};
use std::fmt;

/// A deferred element lookup: a CSS selector, an optional case-insensitive
/// text filter and an optional index into the filtered matches.
///
/// Without an index, single-element operations are strict: they fail when
/// the query resolves to more than one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementQuery {
    pub selector: String,
    pub has_text: Option<String>,
    pub nth: Option<usize>,
}

impl ElementQuery {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            has_text: None,
            nth: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.nth = Some(index);
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Whether `text` passes the `has_text` filter.
    pub fn text_matches(&self, text: &str) -> bool {
        match &self.has_text {
            Some(needle) => text.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.selector)?;
        if let Some(ref text) = self.has_text {
            write!(f, " >> has-text=\"{}\"", text)?;
        }
        if let Some(nth) = self.nth {
            write!(f, " >> nth={}", nth)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_filters() {
        let query = ElementQuery::new("nav a").with_text("Docs").nth(2);
        assert_eq!(query.to_string(), "nav a >> has-text=\"Docs\" >> nth=2");
    }

    #[test]
    fn test_text_filter_is_case_insensitive() {
        let query = ElementQuery::new("a").with_text("getting STARTED");
        assert!(query.text_matches("Getting Started guide"));
        assert!(!query.text_matches("Installation"));
        assert!(ElementQuery::new("a").text_matches("anything"));
    }
}
