use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// A shared browser that hands out fresh pages.
///
/// The browser's own lifecycle is owned by whoever launched it; drivers only
/// borrow it long enough to open a page.
#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type Page: Page;

    /// Open a new tab/page
    async fn new_page(&self) -> Result<Self::Page>;
}

/// Something selectors can be resolved against: a whole page or one element.
///
/// Implementations are cheap handles (clone = another reference to the same
/// page or node). Whether the scope can wait for a selector to appear is a
/// property of the type, so locators decide once, at construction.
#[async_trait]
pub trait Scope: Clone + Send + Sync + 'static {
    type Handle: ElementHandle;

    /// Whether `wait_for_selector` actually waits.
    const WAITS_FOR_SELECTORS: bool;

    /// Wait until `selector` matches something, failing with a timeout error
    /// once `timeout` passes. Scopes without the capability return at once.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let _ = (selector, timeout);
        Ok(())
    }

    /// First match in document order, if any.
    async fn query_selector(&self, selector: &str) -> Result<Option<Self::Handle>>;

    /// All matches in document order.
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Handle>>;

    /// Apply a JavaScript function to the first match. No match is an error.
    async fn eval_selector(&self, selector: &str, function: &str) -> Result<Value>;

    /// Apply a JavaScript function to the array of all matches (possibly empty).
    async fn eval_selector_all(&self, selector: &str, function: &str) -> Result<Value>;
}

/// A resolved DOM node. Elements are scopes themselves, without waiting.
#[async_trait]
pub trait ElementHandle: Scope<Handle = Self> {
    async fn click(&self) -> Result<()>;
}

/// A full page: a waiting scope plus navigation and script evaluation.
#[async_trait]
pub trait Page: Scope {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate an expression in the page and return its value
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    /// Re-evaluate `function(...args)` in the page until it returns something
    /// truthy, failing with a timeout error once `timeout` passes.
    async fn wait_for_function(
        &self,
        function: &str,
        args: Vec<Value>,
        timeout: Duration,
    ) -> Result<()>;
}
