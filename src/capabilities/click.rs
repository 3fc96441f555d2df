use crate::core::{ElementHandle, Scope};
use crate::dom::Locator;
use crate::errors::Result;
use crate::types::Selector;
use tracing::debug;

/// Clicks the first match. Nothing to click is not an error: optional UI
/// affordances may simply be absent.
#[derive(Clone)]
pub struct Click<S: Scope> {
    locator: Locator<S>,
}

impl<S: Scope> Click<S> {
    pub fn new(locator: Locator<S>) -> Self {
        Self { locator }
    }

    pub async fn on(&self, selector: impl Into<Selector>) -> Result<()> {
        let css = selector.into().to_css();

        let element = match self.locator.element(&css).await {
            Ok(element) => element,
            // the page-level wait gave up: same as no match
            Err(err) if err.is_timeout() => None,
            Err(err) => return Err(err),
        };

        match element {
            Some(element) => element.click().await,
            None => {
                debug!(selector = %css, "nothing to click");
                Ok(())
            }
        }
    }

    pub async fn hook(&self, hook: &str) -> Result<()> {
        self.on(Selector::hook(hook)).await
    }

    pub async fn attr(&self, attr: &str) -> Result<()> {
        self.on(Selector::attr(attr)).await
    }

    pub async fn select(&self, selector: &str) -> Result<()> {
        self.on(Selector::raw(selector)).await
    }
}
