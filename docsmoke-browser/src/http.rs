// Static-DOM session backend. Scripts are never executed.

use crate::error::{Result, SessionError};
use crate::query::ElementQuery;
use crate::session::{NavResponse, Session, SessionOptions, Timeouts};
use crate::trace::{TraceEntry, TraceLog};
use async_trait::async_trait;
use reqwest::Client;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Elements whose contents never render.
const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "template", "noscript", "title", "meta", "link",
];

#[derive(Debug, Default)]
struct PageState {
    url: Option<Url>,
    status: Option<u16>,
    html: String,
    history: Vec<Url>,
    /// Filled values keyed by element position in document order.
    values: HashMap<usize, String>,
    scroll_target: Option<String>,
}

enum ClickEffect {
    Navigate(Url),
    Fragment(Url),
    Submit {
        post: bool,
        action: Url,
        fields: Vec<(String, String)>,
    },
    Nothing,
}

pub struct HttpSession {
    client: Client,
    options: SessionOptions,
    state: Mutex<PageState>,
    trace: TraceLog,
}

impl HttpSession {
    pub fn new(options: SessionOptions) -> Result<Self> {
        let navigation = options.timeouts.navigation;
        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(navigation)
            .connect_timeout(navigation / 2)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            options,
            state: Mutex::new(PageState::default()),
            trace: TraceLog::new(),
        })
    }

    /// Selector most recently scrolled into view, if any.
    pub fn scroll_target(&self) -> Option<String> {
        self.state().ok().and_then(|s| s.scroll_target.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, PageState>> {
        self.state
            .lock()
            .map_err(|_| SessionError::Other("session state lock poisoned".to_string()))
    }

    fn resolve_target(&self, url: &str) -> Result<Url> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        // Relative targets resolve against the base URL, like the WebDriver
        // backend. The current page is only used when no base is set.
        let base = match &self.options.base_url {
            Some(base) => Some(base.clone()),
            None => self.state()?.url.clone(),
        };
        let base = base.ok_or_else(|| {
            SessionError::InvalidUrl(format!("{} is relative and no base URL is set", url))
        })?;
        base.join(url)
            .map_err(|e| SessionError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Parse the current document and hand it to `f`.
    fn with_document<T>(&self, f: impl FnOnce(&Html, &PageState) -> Result<T>) -> Result<T> {
        let state = self.state()?;
        if state.url.is_none() {
            return Err(SessionError::NoPage);
        }
        let document = Html::parse_document(&state.html);
        f(&document, &state)
    }

    async fn load(
        &self,
        request: reqwest::RequestBuilder,
        target: &Url,
        push_history: bool,
    ) -> Result<NavResponse> {
        let after = self.options.timeouts.navigation;
        let response = request.timeout(after).send().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout {
                    what: format!("navigating to {}", target),
                    after,
                }
            } else {
                SessionError::HttpError(e)
            }
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                SessionError::Timeout {
                    what: format!("reading {}", target),
                    after,
                }
            } else {
                SessionError::HttpError(e)
            }
        })?;

        debug!("Loaded {} ({}, {} bytes)", final_url, status, body.len());

        let mut state = self.state()?;
        if push_history && let Some(previous) = state.url.take() {
            state.history.push(previous);
        }
        state.url = Some(final_url.clone());
        state.status = Some(status);
        state.html = body;
        state.values.clear();
        state.scroll_target = None;

        Ok(NavResponse {
            status: Some(status),
            url: final_url.to_string(),
        })
    }

    async fn goto_inner(&self, url: &str) -> Result<NavResponse> {
        let target = self.resolve_target(url)?;
        let request = self.client.get(target.clone());
        self.load(request, &target, true).await
    }

    async fn click_inner(&self, query: &ElementQuery) -> Result<()> {
        let effect = self.with_document(|document, state| {
            let element = resolve_one(document, query)?;
            ensure_interactable(element, query)?;
            let current = state.url.clone().ok_or(SessionError::NoPage)?;

            let anchor = std::iter::once(element)
                .chain(element.ancestors().filter_map(ElementRef::wrap))
                .find(|e| e.value().name() == "a" && e.value().attr("href").is_some());
            if let Some(anchor) = anchor {
                let href = anchor.value().attr("href").unwrap_or_default();
                return Ok(link_effect(&current, href.trim()));
            }

            if is_submit_control(element)
                && let Some(form) = element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == "form")
            {
                return form_submission(document, form, &current, &state.values);
            }

            Ok(ClickEffect::Nothing)
        })?;

        match effect {
            ClickEffect::Navigate(url) => {
                self.load(self.client.get(url.clone()), &url, true).await?;
            }
            ClickEffect::Fragment(url) => {
                let mut state = self.state()?;
                if let Some(previous) = state.url.replace(url) {
                    state.history.push(previous);
                }
            }
            ClickEffect::Submit {
                post,
                action,
                fields,
            } => {
                let request = if post {
                    let body = url::form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(fields.iter())
                        .finish();
                    self.client
                        .post(action.clone())
                        .header(
                            reqwest::header::CONTENT_TYPE,
                            "application/x-www-form-urlencoded",
                        )
                        .body(body)
                } else {
                    let mut target = action.clone();
                    target.query_pairs_mut().clear().extend_pairs(fields.iter());
                    self.client.get(target)
                };
                self.load(request, &action, true).await?;
            }
            ClickEffect::Nothing => {
                debug!("Click on {} did not navigate", query);
            }
        }
        Ok(())
    }

    fn fill_inner(&self, query: &ElementQuery, value: &str) -> Result<()> {
        let mut state = self.state()?;
        if state.url.is_none() {
            return Err(SessionError::NoPage);
        }
        let key = {
            let document = Html::parse_document(&state.html);
            let element = resolve_one(&document, query)?;
            ensure_interactable(element, query)?;
            ensure_editable(element, query)?;
            element_key(&document, element)
        };
        state.values.insert(key, value.to_string());
        Ok(())
    }
}

#[async_trait]
impl Session for HttpSession {
    fn timeouts(&self) -> Timeouts {
        self.options.timeouts
    }

    async fn goto(&self, url: &str) -> Result<NavResponse> {
        let started = Instant::now();
        let result = self.goto_inner(url).await;
        self.trace
            .record("goto", Some(url.to_string()), started, &result);
        result
    }

    async fn go_back(&self) -> Result<Option<NavResponse>> {
        let started = Instant::now();
        let previous = self.state()?.history.pop();
        let result = match previous {
            Some(url) => self
                .load(self.client.get(url.clone()), &url, false)
                .await
                .map(Some),
            None => Ok(None),
        };
        self.trace.record("go_back", None, started, &result);
        result
    }

    async fn wait_for_load(&self) -> Result<()> {
        // The body has been read in full by the time goto returns.
        if self.state()?.url.is_none() {
            return Err(SessionError::NoPage);
        }
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        self.with_document(|document, _| {
            let selector = parse_selector("title")?;
            Ok(document
                .select(&selector)
                .next()
                .map(rendered_text)
                .unwrap_or_default())
        })
    }

    async fn current_url(&self) -> Result<String> {
        self.state()?
            .url
            .as_ref()
            .map(|u| u.to_string())
            .ok_or(SessionError::NoPage)
    }

    async fn status(&self) -> Result<Option<u16>> {
        let state = self.state()?;
        if state.url.is_none() {
            return Err(SessionError::NoPage);
        }
        Ok(state.status)
    }

    async fn content(&self) -> Result<String> {
        let state = self.state()?;
        if state.url.is_none() {
            return Err(SessionError::NoPage);
        }
        Ok(state.html.clone())
    }

    async fn count(&self, query: &ElementQuery) -> Result<usize> {
        self.with_document(|document, _| {
            let found = matches(document, query)?;
            Ok(match query.nth {
                Some(index) => usize::from(index < found.len()),
                None => found.len(),
            })
        })
    }

    async fn inner_text(&self, query: &ElementQuery) -> Result<String> {
        self.with_document(|document, _| Ok(rendered_text(resolve_one(document, query)?)))
    }

    async fn attribute(&self, query: &ElementQuery, name: &str) -> Result<Option<String>> {
        self.with_document(|document, _| {
            let element = resolve_one(document, query)?;
            Ok(element.value().attr(name).map(|v| v.to_string()))
        })
    }

    async fn is_visible(&self, query: &ElementQuery) -> Result<bool> {
        self.with_document(|document, _| {
            let found = matches(document, query)?;
            let element = match (query.nth, found.len()) {
                (Some(index), _) => found.get(index).copied(),
                (None, 0) => None,
                (None, 1) => Some(found[0]),
                (None, count) => {
                    return Err(SessionError::StrictModeViolation {
                        selector: query.to_string(),
                        count,
                    });
                }
            };
            Ok(element.map(is_rendered).unwrap_or(false))
        })
    }

    async fn click(&self, query: &ElementQuery) -> Result<()> {
        let started = Instant::now();
        let result = self.click_inner(query).await;
        self.trace
            .record("click", Some(query.to_string()), started, &result);
        result
    }

    async fn fill(&self, query: &ElementQuery, value: &str) -> Result<()> {
        let started = Instant::now();
        let result = self.fill_inner(query, value);
        self.trace
            .record("fill", Some(query.to_string()), started, &result);
        result
    }

    async fn input_value(&self, query: &ElementQuery) -> Result<String> {
        self.with_document(|document, state| {
            let element = resolve_one(document, query)?;
            if let Some(value) = state.values.get(&element_key(document, element)) {
                return Ok(value.clone());
            }
            if element.value().name() == "textarea" {
                return Ok(element.text().collect());
            }
            Ok(element.value().attr("value").unwrap_or_default().to_string())
        })
    }

    async fn scroll_into_view(&self, query: &ElementQuery) -> Result<()> {
        let started = Instant::now();
        let result = self
            .with_document(|document, _| resolve_one(document, query).map(|_| ()))
            .and_then(|_| {
                self.state()?.scroll_target = Some(query.selector.clone());
                Ok(())
            });
        self.trace
            .record("scroll_into_view", Some(query.to_string()), started, &result);
        result
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.with_document(|_, _| Ok(())).and_then(|_| {
            self.state()?.scroll_target = Some("body".to_string());
            Ok(())
        });
        self.trace.record("scroll_to_bottom", None, started, &result);
        result
    }

    async fn screenshot(&self, path: &Path) -> Result<PathBuf> {
        let started = Instant::now();
        // No renderer: the capture is the DOM snapshot.
        let target = path.with_extension("html");
        let html = self.content().await;
        let result = match html {
            Ok(html) => {
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&target, html).await?;
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
        let mut state = self.state()?;
        state.url = None;
        state.html.clear();
        state.history.clear();
        state.values.clear();
        Ok(())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| SessionError::InvalidSelector(selector.to_string()))
}

fn matches<'a>(document: &'a Html, query: &ElementQuery) -> Result<Vec<ElementRef<'a>>> {
    let selector = parse_selector(&query.selector)?;
    Ok(document
        .select(&selector)
        .filter(|element| query.text_matches(&rendered_text(*element)))
        .collect())
}

fn resolve_one<'a>(document: &'a Html, query: &ElementQuery) -> Result<ElementRef<'a>> {
    let found = matches(document, query)?;
    match query.nth {
        Some(index) => found
            .get(index)
            .copied()
            .ok_or_else(|| SessionError::NotFound(query.to_string())),
        None => match found.len() {
            0 => Err(SessionError::NotFound(query.to_string())),
            1 => Ok(found[0]),
            count => Err(SessionError::StrictModeViolation {
                selector: query.to_string(),
                count,
            }),
        },
    }
}

/// Stable key for an element: its position in document order.
fn element_key(document: &Html, element: ElementRef<'_>) -> usize {
    document
        .root_element()
        .descendants()
        .position(|node| node.id() == element.id())
        .unwrap_or(usize::MAX)
}

/// Text as a reader would see it: script and style contents dropped,
/// whitespace collapsed.
pub(crate) fn rendered_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let suppressed = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|a| a.id() != element.id())
                .any(|a| matches!(a.value().name(), "script" | "style" | "noscript" | "template"));
            if !suppressed {
                parts.push(&**text);
            }
        }
    }
    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn hidden_by_markup(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if NON_RENDERED_TAGS.contains(&value.name()) || value.attr("hidden").is_some() {
        return true;
    }
    if value.name() == "input"
        && value
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
    {
        return true;
    }
    if let Some(style) = value.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    false
}

/// Visible as far as markup alone can tell.
pub(crate) fn is_rendered(element: ElementRef<'_>) -> bool {
    !hidden_by_markup(&element)
        && !element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| hidden_by_markup(&a))
}

fn ensure_interactable(element: ElementRef<'_>, query: &ElementQuery) -> Result<()> {
    let reason = if element.value().attr("disabled").is_some() {
        "element is disabled"
    } else if !is_rendered(element) {
        "element is not visible"
    } else {
        return Ok(());
    };
    Err(SessionError::NotInteractable {
        selector: query.to_string(),
        reason: reason.to_string(),
    })
}

fn ensure_editable(element: ElementRef<'_>, query: &ElementQuery) -> Result<()> {
    let value = element.value();
    let editable = match value.name() {
        "textarea" => true,
        "input" => !matches!(
            value.attr("type").map(|t| t.to_ascii_lowercase()).as_deref(),
            Some("submit" | "button" | "reset" | "checkbox" | "radio" | "image" | "file")
        ),
        _ => value.attr("contenteditable").is_some(),
    };
    if !editable {
        return Err(SessionError::NotInteractable {
            selector: query.to_string(),
            reason: format!("<{}> is not editable", value.name()),
        });
    }
    if value.attr("readonly").is_some() {
        return Err(SessionError::NotInteractable {
            selector: query.to_string(),
            reason: "element is read-only".to_string(),
        });
    }
    Ok(())
}

fn is_submit_control(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let kind = value.attr("type").map(|t| t.to_ascii_lowercase());
    match value.name() {
        "button" => kind.is_none() || kind.as_deref() == Some("submit"),
        "input" => matches!(kind.as_deref(), Some("submit" | "image")),
        _ => false,
    }
}

fn link_effect(current: &Url, href: &str) -> ClickEffect {
    if href.is_empty() {
        return ClickEffect::Nothing;
    }
    if let Some(fragment) = href.strip_prefix('#') {
        let mut target = current.clone();
        target.set_fragment(Some(fragment));
        return ClickEffect::Fragment(target);
    }
    match current.join(href) {
        Ok(target) if matches!(target.scheme(), "http" | "https") => {
            ClickEffect::Navigate(target)
        }
        _ => ClickEffect::Nothing,
    }
}

fn form_submission(
    document: &Html,
    form: ElementRef<'_>,
    current: &Url,
    values: &HashMap<usize, String>,
) -> Result<ClickEffect> {
    let action = match form.value().attr("action") {
        Some(action) if !action.trim().is_empty() => current
            .join(action.trim())
            .map_err(|e| SessionError::InvalidUrl(format!("{}: {}", action, e)))?,
        _ => current.clone(),
    };
    let post = form
        .value()
        .attr("method")
        .is_some_and(|m| m.eq_ignore_ascii_case("post"));

    let fields_selector = parse_selector("input[name], textarea[name]")?;
    let fields = form
        .select(&fields_selector)
        .filter(|field| {
            !matches!(
                field.value().attr("type").map(|t| t.to_ascii_lowercase()).as_deref(),
                Some("submit" | "button" | "reset" | "image")
            ) && field.value().attr("disabled").is_none()
        })
        .filter_map(|field| {
            let name = field.value().attr("name")?.to_string();
            let value = values
                .get(&element_key(document, field))
                .cloned()
                .or_else(|| field.value().attr("value").map(|v| v.to_string()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect();

    Ok(ClickEffect::Submit {
        post,
        action,
        fields,
    })
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base_url", &self.options.base_url)
            .finish()
    }
}
