// Web-first assertions. Count preconditions fail on zero matches.

use crate::error::{Result, SmokeError};
use crate::helpers::is_not_found_text;
use docsmoke_browser::{Locator, NavResponse};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn expect_eq<T: PartialEq + Debug>(actual: T, expected: T, what: &str) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(SmokeError::assertion(
            what,
            format!("{:?}", expected),
            format!("{:?}", actual),
        ))
    }
}

pub fn expect_true(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(SmokeError::assertion(what, true, false))
    }
}

pub fn expect_gt(actual: usize, threshold: usize, what: &str) -> Result<()> {
    if actual > threshold {
        Ok(())
    } else {
        Err(SmokeError::assertion(
            what,
            format!("> {}", threshold),
            actual,
        ))
    }
}

pub fn expect_status(response: &NavResponse, expected: u16) -> Result<()> {
    match response.status {
        Some(status) if status == expected => Ok(()),
        Some(status) => Err(SmokeError::assertion(
            format!("response status for {}", response.url),
            expected,
            status,
        )),
        None => Err(SmokeError::assertion(
            format!("response status for {}", response.url),
            expected,
            "no status observed",
        )),
    }
}

/// Fails when `text` reads like a not-found page.
pub fn expect_not_not_found(text: &str, what: &str) -> Result<()> {
    if is_not_found_text(text) {
        Err(SmokeError::assertion(
            format!("{} must not look like a not-found page", what),
            "no \"404\" / \"page not found\"",
            text,
        ))
    } else {
        Ok(())
    }
}

/// Wait (up to the expect timeout) for at least one match and return the
/// count. Zero matches is a precondition failure.
pub async fn expect_count_gt_zero(locator: &Locator, what: &str) -> Result<usize> {
    let timeout = locator.session().timeouts().expect;
    let (passed, count) = eventually(timeout, || async {
        let count = locator.count().await?;
        Ok((count > 0, count))
    })
    .await?;

    if passed {
        Ok(count)
    } else {
        Err(SmokeError::Precondition(format!(
            "expected at least one {} matching {}, found none",
            what, locator
        )))
    }
}

/// Per-element locators, guaranteed non-empty. The only way specs iterate
/// over matches.
pub async fn expect_nonempty(locator: &Locator, what: &str) -> Result<Vec<Locator>> {
    let count = expect_count_gt_zero(locator, what).await?;
    Ok((0..count).map(|i| locator.nth(i)).collect())
}

pub async fn expect_count(locator: &Locator, expected: usize) -> Result<()> {
    let timeout = locator.session().timeouts().expect;
    let (passed, count) = eventually(timeout, || async {
        let count = locator.count().await?;
        Ok((count == expected, count))
    })
    .await?;

    if passed {
        Ok(())
    } else {
        Err(SmokeError::assertion(
            format!("count of {}", locator),
            expected,
            count,
        ))
    }
}

pub async fn expect_visible(locator: &Locator) -> Result<()> {
    let timeout = locator.session().timeouts().expect;
    let (passed, state) = eventually(timeout, || async {
        if locator.count().await? == 0 {
            return Ok((false, "not found"));
        }
        let visible = locator.is_visible().await?;
        Ok((visible, if visible { "visible" } else { "hidden" }))
    })
    .await?;

    if passed {
        Ok(())
    } else {
        Err(SmokeError::assertion(
            format!("{} to be visible", locator),
            "visible",
            state,
        ))
    }
}

/// Case-insensitive substring match on the element's rendered text.
pub async fn expect_text(locator: &Locator, expected: &str) -> Result<()> {
    let timeout = locator.session().timeouts().expect;
    let needle = expected.to_lowercase();
    let (passed, text) = eventually(timeout, || async {
        if locator.count().await? == 0 {
            return Ok((false, String::from("<no element>")));
        }
        let text = locator.inner_text().await?;
        Ok((text.to_lowercase().contains(&needle), text))
    })
    .await?;

    if passed {
        Ok(())
    } else {
        Err(SmokeError::assertion(
            format!("text of {}", locator),
            format!("to contain \"{}\"", expected),
            text,
        ))
    }
}

/// Poll `check` until it reports success or `timeout` elapses. Returns the
/// last observation either way; check errors end the wait immediately.
async fn eventually<F, Fut, T>(timeout: Duration, mut check: F) -> Result<(bool, T)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(bool, T)>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let (passed, observed) = check().await?;
        let now = Instant::now();
        if passed || now >= deadline {
            return Ok((passed, observed));
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}
