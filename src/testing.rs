//! In-process stand-ins for the browser and the backend, used by unit tests.

use crate::core::{BrowserTrait, ElementHandle, Page, Scope};
use crate::errors::{HarnessError, Result};
use crate::utils::javascript::{BODY_HTML, LOCATION_HASH};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use scraper::{ElementRef, Html, Selector as CssSelector};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FakeCall {
    Wait { selector: String, timeout_ms: u64 },
    Eval { selector: String, function: String },
    Click(String),
    Goto(String),
    WaitForFunction { args: Vec<Value>, timeout_ms: u64 },
}

#[derive(Debug, Default)]
struct FakeDom {
    html: Mutex<String>,
    hash: Mutex<String>,
    calls: Mutex<Vec<FakeCall>>,
}

/// A match: index among all elements in document order, a label for click
/// bookkeeping (`data-hook` or tag name), its `id` and trimmed text content.
struct Match {
    index: usize,
    label: String,
    id: String,
    text: String,
}

impl FakeDom {
    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn matches(&self, root: Option<usize>, selector: &str) -> Result<Vec<Match>> {
        let css = CssSelector::parse(selector).map_err(|e| {
            HarnessError::JavaScriptFailed(format!("invalid selector {:?}: {:?}", selector, e))
        })?;
        let everything = CssSelector::parse("*").unwrap();
        let html = Html::parse_document(&self.html.lock().unwrap());
        let all: Vec<ElementRef> = html.select(&everything).collect();

        let found: Vec<ElementRef> = match root {
            None => html.select(&css).collect(),
            Some(index) => {
                let root = all
                    .get(index)
                    .ok_or_else(|| HarnessError::Browser("detached element handle".into()))?;
                root.select(&css).filter(|e| e.id() != root.id()).collect()
            }
        };

        Ok(found
            .into_iter()
            .map(|e| Match {
                index: all.iter().position(|a| a.id() == e.id()).unwrap(),
                label: e
                    .value()
                    .attr("data-hook")
                    .map(String::from)
                    .unwrap_or_else(|| e.value().name().to_string()),
                id: e.value().id().unwrap_or_default().to_string(),
                text: e.text().collect::<String>().trim().to_string(),
            })
            .collect())
    }

    fn label_of(&self, index: usize) -> Result<String> {
        let html = Html::parse_document(&self.html.lock().unwrap());
        let everything = CssSelector::parse("*").unwrap();
        let element = html
            .select(&everything)
            .nth(index)
            .ok_or_else(|| HarnessError::Browser("detached element handle".into()))?;
        Ok(element
            .value()
            .attr("data-hook")
            .map(String::from)
            .unwrap_or_else(|| element.value().name().to_string()))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakePage {
    dom: Arc<FakeDom>,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    dom: Arc<FakeDom>,
    index: usize,
}

impl FakePage {
    pub(crate) fn new(html: &str) -> Self {
        let dom = FakeDom::default();
        *dom.html.lock().unwrap() = html.to_string();
        Self { dom: Arc::new(dom) }
    }

    pub(crate) fn calls(&self) -> Vec<FakeCall> {
        self.dom.calls.lock().unwrap().clone()
    }

    pub(crate) fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FakeCall::Click(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    fn element(&self, index: usize) -> FakeElement {
        FakeElement {
            dom: self.dom.clone(),
            index,
        }
    }
}

#[async_trait]
impl Scope for FakePage {
    type Handle = FakeElement;

    const WAITS_FOR_SELECTORS: bool = true;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.dom.record(FakeCall::Wait {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        });
        if self.dom.matches(None, selector)?.is_empty() {
            return Err(HarnessError::timeout(selector, timeout));
        }
        Ok(())
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<FakeElement>> {
        let first = self.dom.matches(None, selector)?.into_iter().next();
        Ok(first.map(|m| self.element(m.index)))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        let found = self.dom.matches(None, selector)?;
        Ok(found.into_iter().map(|m| self.element(m.index)).collect())
    }

    async fn eval_selector(&self, selector: &str, function: &str) -> Result<Value> {
        eval_one(&self.dom, None, selector, function)
    }

    async fn eval_selector_all(&self, selector: &str, function: &str) -> Result<Value> {
        eval_all(&self.dom, None, selector, function)
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.dom.record(FakeCall::Goto(url.to_string()));
        let hash = url.split_once('#').map(|(_, h)| h).unwrap_or("");
        *self.dom.hash.lock().unwrap() = hash.to_string();
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        match expression {
            LOCATION_HASH => Ok(json!(format!("#{}", self.dom.hash.lock().unwrap()))),
            BODY_HTML => Ok(json!(self.dom.html.lock().unwrap().clone())),
            other => Err(HarnessError::JavaScriptFailed(format!(
                "fake page cannot evaluate {:?}",
                other
            ))),
        }
    }

    // Treats the first argument as a pattern that must equal the current hash.
    async fn wait_for_function(
        &self,
        _function: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<()> {
        self.dom.record(FakeCall::WaitForFunction {
            args: args.clone(),
            timeout_ms: timeout.as_millis() as u64,
        });
        let hash = self.dom.hash.lock().unwrap().clone();
        match args.first().and_then(Value::as_str) {
            Some(pattern) if pattern == hash => Ok(()),
            _ => Err(HarnessError::timeout("function", timeout)),
        }
    }
}

#[async_trait]
impl Scope for FakeElement {
    type Handle = FakeElement;

    const WAITS_FOR_SELECTORS: bool = false;

    async fn query_selector(&self, selector: &str) -> Result<Option<FakeElement>> {
        let first = self.dom.matches(Some(self.index), selector)?.into_iter().next();
        Ok(first.map(|m| FakeElement {
            dom: self.dom.clone(),
            index: m.index,
        }))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<FakeElement>> {
        let found = self.dom.matches(Some(self.index), selector)?;
        Ok(found
            .into_iter()
            .map(|m| FakeElement {
                dom: self.dom.clone(),
                index: m.index,
            })
            .collect())
    }

    async fn eval_selector(&self, selector: &str, function: &str) -> Result<Value> {
        eval_one(&self.dom, Some(self.index), selector, function)
    }

    async fn eval_selector_all(&self, selector: &str, function: &str) -> Result<Value> {
        eval_all(&self.dom, Some(self.index), selector, function)
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn click(&self) -> Result<()> {
        let label = self.dom.label_of(self.index)?;
        self.dom.record(FakeCall::Click(label));
        Ok(())
    }
}

// Only the element reads the tests use are modelled: `textContent`, `id`
// and, over a list, `length`. Anything else is a script failure.
fn read_one(function: &str, m: Match) -> Result<Value> {
    if function.contains("textContent") {
        Ok(json!(m.text))
    } else if function.contains(".id") {
        Ok(json!(m.id))
    } else {
        Err(HarnessError::JavaScriptFailed(format!(
            "fake DOM cannot evaluate {:?}",
            function
        )))
    }
}

fn eval_one(dom: &FakeDom, root: Option<usize>, selector: &str, function: &str) -> Result<Value> {
    dom.record(FakeCall::Eval {
        selector: selector.to_string(),
        function: function.to_string(),
    });
    let first = dom
        .matches(root, selector)?
        .into_iter()
        .next()
        .ok_or_else(|| HarnessError::not_found(selector))?;
    read_one(function, first)
}

fn eval_all(dom: &FakeDom, root: Option<usize>, selector: &str, function: &str) -> Result<Value> {
    dom.record(FakeCall::Eval {
        selector: selector.to_string(),
        function: function.to_string(),
    });
    let matches = dom.matches(root, selector)?;
    if function.contains(".length") {
        return Ok(json!(matches.len()));
    }
    matches
        .into_iter()
        .map(|m| read_one(function, m))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// Hands out pages over one shared fake DOM.
pub(crate) struct FakeBrowser {
    page: FakePage,
}

impl FakeBrowser {
    pub(crate) fn new(html: &str) -> Self {
        Self {
            page: FakePage::new(html),
        }
    }
}

#[async_trait]
impl BrowserTrait for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&self) -> Result<FakePage> {
        Ok(self.page.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub path: &'static str,
    pub body: Option<Value>,
}

#[derive(Clone)]
struct EndpointState {
    status: StatusCode,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Backend stand-in serving the mock and health routes on a random port.
pub(crate) struct MockEndpoint {
    pub port: u16,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockEndpoint {
    pub(crate) async fn start() -> Self {
        Self::start_with_status(StatusCode::OK).await
    }

    pub(crate) async fn start_with_status(status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = EndpointState {
            status,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/mock/pattern", post(register_pattern))
            .route("/mock/reset", get(reset_patterns))
            .route("/health/is_alive", get(is_alive))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            port,
            requests,
            task,
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn register_pattern(State(state): State<EndpointState>, Json(body): Json<Value>) -> StatusCode {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "POST",
        path: "/mock/pattern",
        body: Some(body),
    });
    state.status
}

async fn reset_patterns(State(state): State<EndpointState>) -> StatusCode {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "GET",
        path: "/mock/reset",
        body: None,
    });
    state.status
}

async fn is_alive(State(state): State<EndpointState>) -> StatusCode {
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "GET",
        path: "/health/is_alive",
        body: None,
    });
    state.status
}
