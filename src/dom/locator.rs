use crate::core::config::DEFAULT_WAIT_TIMEOUT_MS;
use crate::core::Scope;
use crate::errors::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const WAIT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS);

/// Resolves selectors against one scope.
///
/// Page scopes first wait for the selector to appear (bounded); element
/// scopes resolve immediately. A timed-out wait is returned as-is; retrying
/// is the caller's business.
#[derive(Clone)]
pub struct Locator<S: Scope> {
    scope: S,
    wait: Option<Duration>,
}

impl<S: Scope> Locator<S> {
    pub fn new(scope: S) -> Self {
        Self::with_timeout(scope, WAIT_TIMEOUT)
    }

    pub fn with_timeout(scope: S, timeout: Duration) -> Self {
        let wait = S::WAITS_FOR_SELECTORS.then_some(timeout);
        Self { scope, wait }
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    /// The wait bound, or `None` for scopes that resolve immediately.
    pub fn wait_bound(&self) -> Option<Duration> {
        self.wait
    }

    async fn settle(&self, selector: &str) -> Result<()> {
        if let Some(timeout) = self.wait {
            debug!(selector, timeout_ms = timeout.as_millis() as u64, "waiting for selector");
            self.scope.wait_for_selector(selector, timeout).await?;
        }
        Ok(())
    }

    pub async fn element(&self, selector: &str) -> Result<Option<S::Handle>> {
        self.settle(selector).await?;
        self.scope.query_selector(selector).await
    }

    pub async fn elements(&self, selector: &str) -> Result<Vec<S::Handle>> {
        self.settle(selector).await?;
        self.scope.query_selector_all(selector).await
    }

    pub async fn eval_one(&self, selector: &str, function: &str) -> Result<Value> {
        self.settle(selector).await?;
        self.scope.eval_selector(selector, function).await
    }

    pub async fn eval_many(&self, selector: &str, function: &str) -> Result<Value> {
        self.settle(selector).await?;
        self.scope.eval_selector_all(selector, function).await
    }
}
