use docsmoke_browser::SessionError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("Assertion failed: {message}\n  expected: {expected}\n  actual:   {actual}")]
    Assertion {
        message: String,
        expected: String,
        actual: String,
    },

    /// Zero elements matched where at least one was required. Raised instead
    /// of letting a loop over the matches pass vacuously.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Timed out after {after:?}: {what}")]
    Timeout { what: String, after: Duration },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SmokeError {
    pub fn assertion(
        message: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        SmokeError::Assertion {
            message: message.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            SmokeError::Timeout { .. } => true,
            SmokeError::Session(e) => e.is_timeout(),
            SmokeError::HttpError(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SmokeError>;
