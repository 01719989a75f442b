use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Timed out after {after:?} {what}")]
    Timeout { what: String, after: Duration },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No element matches {0}")]
    NotFound(String),

    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation { selector: String, count: usize },

    #[error("Element {selector} is not interactable: {reason}")]
    NotInteractable { selector: String, reason: String },

    #[error("No page has been loaded in this session")]
    NoPage,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "webdriver")]
    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SessionError {
    /// True for anything that represents an action or navigation that did
    /// not settle in time, including transport-level timeouts.
    pub fn is_timeout(&self) -> bool {
        match self {
            SessionError::Timeout { .. } => true,
            SessionError::HttpError(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
