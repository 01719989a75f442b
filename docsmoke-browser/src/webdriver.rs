// WebDriver session backend

use crate::error::{Result, SessionError};
use crate::query::ElementQuery;
use crate::session::{BrowserKind, NavResponse, Session, SessionOptions, Timeouts};
use crate::trace::{TraceEntry, TraceLog};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

pub struct WebDriverSession {
    client: Client,
    /// Plain HTTP client used to observe document status codes, which the
    /// WebDriver protocol does not expose.
    status_client: reqwest::Client,
    options: SessionOptions,
    trace: TraceLog,
}

fn wd<E: std::fmt::Display>(e: E) -> SessionError {
    SessionError::WebDriver(e.to_string())
}

impl WebDriverSession {
    /// Connect to a running WebDriver service at `endpoint`.
    pub async fn connect(
        endpoint: &str,
        browser: BrowserKind,
        options: SessionOptions,
    ) -> Result<Self> {
        let mut caps = Map::new();
        let mut args = vec![
            format!(
                "--window-size={},{}",
                options.viewport.width, options.viewport.height
            ),
            format!("--user-agent={}", options.user_agent),
        ];
        match browser {
            BrowserKind::Chromium => {
                if !options.headed {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                }
                caps.insert("browserName".to_string(), json!("chrome"));
                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
            BrowserKind::Firefox => {
                let mut firefox_args = Vec::new();
                if !options.headed {
                    firefox_args.push("-headless".to_string());
                }
                caps.insert("browserName".to_string(), json!("firefox"));
                caps.insert(
                    "moz:firefoxOptions".to_string(),
                    json!({ "args": firefox_args }),
                );
            }
            BrowserKind::Webkit => {
                caps.insert("browserName".to_string(), json!("safari"));
            }
        }

        info!("Connecting to WebDriver at {} ({:?})", endpoint, browser);
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(endpoint)
            .await
            .map_err(wd)?;

        client
            .set_window_size(options.viewport.width, options.viewport.height)
            .await
            .map_err(wd)?;

        let status_client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeouts.navigation)
            .build()?;

        Ok(Self {
            client,
            status_client,
            options,
            trace: TraceLog::new(),
        })
    }

    fn absolute(&self, url: &str) -> Result<String> {
        if Url::parse(url).is_ok() {
            return Ok(url.to_string());
        }
        let base = self.options.base_url.as_ref().ok_or_else(|| {
            SessionError::InvalidUrl(format!("{} is relative and no base URL is set", url))
        })?;
        base.join(url)
            .map(|u| u.to_string())
            .map_err(|e| SessionError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Matches in document order, paired with their index among all
    /// selector matches (before text filtering).
    async fn matches(&self, query: &ElementQuery) -> Result<Vec<(usize, Element)>> {
        let elements = self
            .client
            .find_all(Locator::Css(&query.selector))
            .await
            .map_err(wd)?;
        let mut found = Vec::new();
        for (index, element) in elements.into_iter().enumerate() {
            if query.has_text.is_some() {
                let text = element.text().await.map_err(wd)?;
                if !query.text_matches(&text) {
                    continue;
                }
            }
            found.push((index, element));
        }
        Ok(found)
    }

    async fn resolve_one(&self, query: &ElementQuery) -> Result<(usize, Element)> {
        let mut found = self.matches(query).await?;
        match query.nth {
            Some(index) if index < found.len() => Ok(found.swap_remove(index)),
            Some(_) => Err(SessionError::NotFound(query.to_string())),
            None => match found.len() {
                0 => Err(SessionError::NotFound(query.to_string())),
                1 => Ok(found.remove(0)),
                count => Err(SessionError::StrictModeViolation {
                    selector: query.to_string(),
                    count,
                }),
            },
        }
    }

    async fn navigate(&self, url: &str) -> Result<NavResponse> {
        let after = self.options.timeouts.navigation;
        tokio::time::timeout(after, self.client.goto(url))
            .await
            .map_err(|_| SessionError::Timeout {
                what: format!("navigating to {}", url),
                after,
            })?
            .map_err(wd)?;
        self.settle().await
    }

    async fn settle(&self) -> Result<NavResponse> {
        self.wait_for_load().await?;
        let current = self.client.current_url().await.map_err(wd)?;
        let status = match self.status_client.get(current.clone()).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                debug!("Status check for {} failed: {}", current, e);
                None
            }
        };
        Ok(NavResponse {
            status,
            url: current.to_string(),
        })
    }
}

#[async_trait]
impl Session for WebDriverSession {
    fn timeouts(&self) -> Timeouts {
        self.options.timeouts
    }

    async fn goto(&self, url: &str) -> Result<NavResponse> {
        let started = Instant::now();
        let result = match self.absolute(url) {
            Ok(target) => self.navigate(&target).await,
            Err(e) => Err(e),
        };
        self.trace
            .record("goto", Some(url.to_string()), started, &result);
        result
    }

    async fn go_back(&self) -> Result<Option<NavResponse>> {
        let started = Instant::now();
        let result = match self.client.back().await.map_err(wd) {
            Ok(()) => self.settle().await.map(Some),
            Err(e) => Err(e),
        };
        self.trace.record("go_back", None, started, &result);
        result
    }

    async fn wait_for_load(&self) -> Result<()> {
        let after = self.options.timeouts.navigation;
        let deadline = tokio::time::Instant::now() + after;
        loop {
            let state = self
                .client
                .execute("return document.readyState", vec![])
                .await
                .map_err(wd)?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SessionError::Timeout {
                    what: "waiting for document load".to_string(),
                    after,
                });
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    async fn title(&self) -> Result<String> {
        self.client.title().await.map_err(wd)
    }

    async fn current_url(&self) -> Result<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(wd)
    }

    async fn status(&self) -> Result<Option<u16>> {
        let current = self.client.current_url().await.map_err(wd)?;
        Ok(self
            .status_client
            .get(current)
            .send()
            .await
            .ok()
            .map(|response| response.status().as_u16()))
    }

    async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(wd)
    }

    async fn count(&self, query: &ElementQuery) -> Result<usize> {
        let found = self.matches(query).await?.len();
        Ok(match query.nth {
            Some(index) => usize::from(index < found),
            None => found,
        })
    }

    async fn inner_text(&self, query: &ElementQuery) -> Result<String> {
        let (_, element) = self.resolve_one(query).await?;
        let text = element.text().await.map_err(wd)?;
        Ok(text.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    async fn attribute(&self, query: &ElementQuery, name: &str) -> Result<Option<String>> {
        let (_, element) = self.resolve_one(query).await?;
        element.attr(name).await.map_err(wd)
    }

    async fn is_visible(&self, query: &ElementQuery) -> Result<bool> {
        match self.resolve_one(query).await {
            Ok((_, element)) => element.is_displayed().await.map_err(wd),
            Err(SessionError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn click(&self, query: &ElementQuery) -> Result<()> {
        let started = Instant::now();
        let result = match self.resolve_one(query).await {
            Ok((_, element)) => element.click().await.map_err(wd),
            Err(e) => Err(e),
        };
        self.trace
            .record("click", Some(query.to_string()), started, &result);
        result
    }

    async fn fill(&self, query: &ElementQuery, value: &str) -> Result<()> {
        let started = Instant::now();
        let result = match self.resolve_one(query).await {
            Ok((_, element)) => match element.clear().await.map_err(wd) {
                Ok(()) => element.send_keys(value).await.map_err(wd),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        self.trace
            .record("fill", Some(query.to_string()), started, &result);
        result
    }

    async fn input_value(&self, query: &ElementQuery) -> Result<String> {
        let (_, element) = self.resolve_one(query).await?;
        Ok(element
            .prop("value")
            .await
            .map_err(wd)?
            .unwrap_or_default())
    }

    async fn scroll_into_view(&self, query: &ElementQuery) -> Result<()> {
        let started = Instant::now();
        let result = match self.resolve_one(query).await {
            Ok((index, _)) => self
                .client
                .execute(
                    "document.querySelectorAll(arguments[0])[arguments[1]].scrollIntoView({block: 'center'});",
                    vec![json!(query.selector), json!(index)],
                )
                .await
                .map(|_| ())
                .map_err(wd),
            Err(e) => Err(e),
        };
        self.trace
            .record("scroll_into_view", Some(query.to_string()), started, &result);
        result
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let started = Instant::now();
        let result = self
            .client
            .execute(
                "window.scrollTo(0, document.body.scrollHeight);",
                Vec::<Value>::new(),
            )
            .await
            .map(|_| ())
            .map_err(wd);
        self.trace.record("scroll_to_bottom", None, started, &result);
        result
    }

    async fn screenshot(&self, path: &Path) -> Result<PathBuf> {
        let started = Instant::now();
        let target = path.with_extension("png");
        let result = match self.client.screenshot().await.map_err(wd) {
            Ok(png) => {
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&target, png).await?;
                Ok(target.clone())
            }
            Err(e) => Err(e),
        };
        self.trace.record(
            "screenshot",
            Some(target.display().to_string()),
            started,
            &result,
        );
        result
    }

    fn trace(&self) -> Vec<TraceEntry> {
        self.trace.entries()
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().close().await.map_err(wd)
    }
}
