use crate::core::Scope;
use crate::dom::Locator;
use crate::errors::Result;
use crate::types::Selector;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Runs JavaScript functions against matched elements.
///
/// `function` is function source evaluated in the page, e.g.
/// `el => el.textContent` for single matches or
/// `els => els.map(e => e.value)` for all matches. Its return value must be
/// JSON-serializable. A single-match evaluation with nothing to evaluate
/// against fails; evaluating over all matches accepts an empty list.
#[derive(Clone)]
pub struct Evaluate<S: Scope> {
    locator: Locator<S>,
}

impl<S: Scope> Evaluate<S> {
    pub fn new(locator: Locator<S>) -> Self {
        Self { locator }
    }

    pub async fn one(&self, selector: impl Into<Selector>, function: &str) -> Result<Value> {
        self.locator
            .eval_one(&selector.into().to_css(), function)
            .await
    }

    pub async fn all(&self, selector: impl Into<Selector>, function: &str) -> Result<Value> {
        self.locator
            .eval_many(&selector.into().to_css(), function)
            .await
    }

    pub async fn one_as<T: DeserializeOwned>(
        &self,
        selector: impl Into<Selector>,
        function: &str,
    ) -> Result<T> {
        Ok(serde_json::from_value(self.one(selector, function).await?)?)
    }

    pub async fn all_as<T: DeserializeOwned>(
        &self,
        selector: impl Into<Selector>,
        function: &str,
    ) -> Result<T> {
        Ok(serde_json::from_value(self.all(selector, function).await?)?)
    }

    pub async fn hook(&self, hook: &str, function: &str) -> Result<Value> {
        self.one(Selector::hook(hook), function).await
    }

    pub async fn hooks(&self, hook: &str, function: &str) -> Result<Value> {
        self.all(Selector::hook(hook), function).await
    }

    pub async fn attr(&self, attr: &str, function: &str) -> Result<Value> {
        self.one(Selector::attr(attr), function).await
    }

    pub async fn attrs(&self, attr: &str, function: &str) -> Result<Value> {
        self.all(Selector::attr(attr), function).await
    }

    pub async fn select(&self, selector: &str, function: &str) -> Result<Value> {
        self.one(Selector::raw(selector), function).await
    }

    pub async fn select_all(&self, selector: &str, function: &str) -> Result<Value> {
        self.all(Selector::raw(selector), function).await
    }
}
