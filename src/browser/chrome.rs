use super::wait::{poll_until_true, POLL_INTERVAL};
use crate::core::{BrowserConfig, BrowserTrait, ElementHandle, Page, Scope};
use crate::errors::{HarnessError, Result};
use crate::utils::javascript::{self, ScriptOutcome};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Chrome driven over the DevTools protocol.
pub struct ChromeBrowser {
    browser: Browser,
}

impl ChromeBrowser {
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        if let Some(port) = config.connect_port {
            return Self::connect(port).await;
        }

        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.viewport.width, config.viewport.height
        );

        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        if config.disable_images {
            args.push(OsStr::new("--blink-settings=imagesEnabled=false"));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| HarnessError::Browser(format!("Failed to launch browser: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| HarnessError::Browser(format!("Failed to launch browser: {}", e)))?;

        Ok(Self { browser })
    }

    /// Attach to a Chrome started with `--remote-debugging-port`.
    pub async fn connect(port: u16) -> Result<Self> {
        info!("Connecting to existing browser on port {}", port);

        let ws_url = debugger_ws_url(&format!("http://127.0.0.1:{}", port)).await?;
        debug!("DevTools endpoint is {}", ws_url);

        let browser = Browser::connect(ws_url)
            .map_err(|e| HarnessError::Browser(format!("Failed to connect to browser: {}", e)))?;

        Ok(Self { browser })
    }
}

#[derive(Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Browser-level websocket URL advertised at `{http_base}/json/version`.
async fn debugger_ws_url(http_base: &str) -> Result<String> {
    let info: VersionInfo = reqwest::get(format!("{}/json/version", http_base))
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(info.web_socket_debugger_url)
}

/// Only an expired wait means "not there"; anything else is a browser fault.
fn wait_error(selector: &str, timeout: Duration, err: anyhow::Error) -> HarnessError {
    if err.downcast_ref::<headless_chrome::util::Timeout>().is_some() {
        debug!("Waiting for {} timed out", selector);
        HarnessError::timeout(selector, timeout)
    } else {
        HarnessError::Browser(format!("Waiting for {} failed: {}", selector, err))
    }
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type Page = ChromePage;

    async fn new_page(&self) -> Result<ChromePage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| HarnessError::Browser(format!("Failed to create tab: {}", e)))?;

        Ok(ChromePage { tab })
    }
}

/// Page scope: waits for selectors before resolving them.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
}

/// Element scope: a node stamped with a handle token. Never waits.
#[derive(Clone)]
pub struct ChromeElement {
    tab: Arc<Tab>,
    token: String,
}

impl ChromePage {
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

impl ChromeElement {
    pub fn token(&self) -> &str {
        &self.token
    }
}

async fn run_script(tab: &Tab, script: &str) -> Result<ScriptOutcome> {
    let result = tab
        .evaluate(script, true)
        .map_err(|e| HarnessError::JavaScriptFailed(e.to_string()))?;
    ScriptOutcome::parse(result.value)
}

async fn tag_first(tab: &Arc<Tab>, root: &str, selector: &str) -> Result<Option<ChromeElement>> {
    let token = Uuid::new_v4().simple().to_string();
    let script = javascript::tag_first_script(root, selector, &token);
    let value = run_script(tab, &script).await?.into_value(selector)?;

    Ok(value.as_str().map(|token| ChromeElement {
        tab: tab.clone(),
        token: token.to_string(),
    }))
}

async fn tag_all(tab: &Arc<Tab>, root: &str, selector: &str) -> Result<Vec<ChromeElement>> {
    let prefix = format!("{}-", Uuid::new_v4().simple());
    let script = javascript::tag_all_script(root, selector, &prefix);
    let tokens: Vec<String> =
        serde_json::from_value(run_script(tab, &script).await?.into_value(selector)?)?;

    Ok(tokens
        .into_iter()
        .map(|token| ChromeElement {
            tab: tab.clone(),
            token,
        })
        .collect())
}

async fn eval_first(tab: &Tab, root: &str, selector: &str, function: &str) -> Result<Value> {
    let script = javascript::eval_one_script(root, selector, function);
    run_script(tab, &script).await?.into_value(selector)
}

async fn eval_every(tab: &Tab, root: &str, selector: &str, function: &str) -> Result<Value> {
    let script = javascript::eval_all_script(root, selector, function);
    run_script(tab, &script).await?.into_value(selector)
}

#[async_trait]
impl Scope for ChromePage {
    type Handle = ChromeElement;

    const WAITS_FOR_SELECTORS: bool = true;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| wait_error(selector, timeout, e))
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<ChromeElement>> {
        tag_first(&self.tab, "document", selector).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        tag_all(&self.tab, "document", selector).await
    }

    async fn eval_selector(&self, selector: &str, function: &str) -> Result<Value> {
        eval_first(&self.tab, "document", selector, function).await
    }

    async fn eval_selector_all(&self, selector: &str, function: &str) -> Result<Value> {
        eval_every(&self.tab, "document", selector, function).await
    }
}

#[async_trait]
impl Page for ChromePage {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| HarnessError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| HarnessError::Browser(format!("Navigation timeout for {}: {}", url, e)))?;

        info!("Navigated to {}", url);
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| HarnessError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn wait_for_function(
        &self,
        function: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<()> {
        let script = javascript::predicate_script(function, &args);
        let tab = &self.tab;
        let script = &script;

        poll_until_true(
            "function",
            move || async move {
                let value = run_script(tab, script).await?.into_value("function")?;
                Ok(value.as_bool().unwrap_or(false))
            },
            timeout,
            POLL_INTERVAL,
        )
        .await
    }
}

#[async_trait]
impl Scope for ChromeElement {
    type Handle = ChromeElement;

    const WAITS_FOR_SELECTORS: bool = false;

    async fn query_selector(&self, selector: &str) -> Result<Option<ChromeElement>> {
        let root = javascript::root_expression(Some(&self.token));
        tag_first(&self.tab, &root, selector).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let root = javascript::root_expression(Some(&self.token));
        tag_all(&self.tab, &root, selector).await
    }

    async fn eval_selector(&self, selector: &str, function: &str) -> Result<Value> {
        let root = javascript::root_expression(Some(&self.token));
        eval_first(&self.tab, &root, selector, function).await
    }

    async fn eval_selector_all(&self, selector: &str, function: &str) -> Result<Value> {
        let root = javascript::root_expression(Some(&self.token));
        eval_every(&self.tab, &root, selector, function).await
    }
}

#[async_trait]
impl ElementHandle for ChromeElement {
    async fn click(&self) -> Result<()> {
        let selector = javascript::handle_selector(&self.token);

        self.tab
            .find_element(&selector)
            .map_err(|e| HarnessError::Browser(format!("Element handle detached: {}", e)))?
            .click()
            .map_err(|e| HarnessError::Browser(format!("Click failed: {}", e)))?;

        Ok(())
    }
}
