use crate::core::Scope;
use crate::dom::Locator;
use crate::errors::Result;
use crate::types::Selector;

/// Element lookup in the three addressing modes.
#[derive(Clone)]
pub struct Query<S: Scope> {
    locator: Locator<S>,
}

impl<S: Scope> Query<S> {
    pub fn new(locator: Locator<S>) -> Self {
        Self { locator }
    }

    pub async fn one(&self, selector: impl Into<Selector>) -> Result<Option<S::Handle>> {
        self.locator.element(&selector.into().to_css()).await
    }

    pub async fn all(&self, selector: impl Into<Selector>) -> Result<Vec<S::Handle>> {
        self.locator.elements(&selector.into().to_css()).await
    }

    pub async fn hook(&self, hook: &str) -> Result<Option<S::Handle>> {
        self.one(Selector::hook(hook)).await
    }

    pub async fn hooks(&self, hook: &str) -> Result<Vec<S::Handle>> {
        self.all(Selector::hook(hook)).await
    }

    pub async fn attr(&self, attr: &str) -> Result<Option<S::Handle>> {
        self.one(Selector::attr(attr)).await
    }

    pub async fn attrs(&self, attr: &str) -> Result<Vec<S::Handle>> {
        self.all(Selector::attr(attr)).await
    }

    pub async fn select(&self, selector: &str) -> Result<Option<S::Handle>> {
        self.one(Selector::raw(selector)).await
    }

    pub async fn select_all(&self, selector: &str) -> Result<Vec<S::Handle>> {
        self.all(Selector::raw(selector)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCall, FakePage};

    const TABLE: &str = r#"
        <table data-hook="results">
            <tr data-hook="row" data-selected><td>a</td></tr>
            <tr data-hook="row"><td>b</td></tr>
            <tr data-hook="row"><td>c</td></tr>
        </table>
    "#;

    #[tokio::test]
    async fn addressing_modes_resolve_the_same_nodes() {
        let query = Query::new(Locator::new(FakePage::new(TABLE)));

        assert_eq!(query.hooks("row").await.unwrap().len(), 3);
        assert_eq!(query.attrs("data-selected").await.unwrap().len(), 1);
        assert_eq!(query.select_all("tr").await.unwrap().len(), 3);
        assert!(query.hook("results").await.unwrap().is_some());
        assert!(query.attr("data-selected").await.unwrap().is_some());
        assert!(query.select("table tr").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn hook_selector_is_what_the_page_waits_for() {
        let page = FakePage::new(TABLE);
        let query = Query::new(Locator::new(page.clone()));

        query.hook("results").await.unwrap();

        assert_eq!(
            page.calls(),
            vec![FakeCall::Wait {
                selector: "[data-hook=\"results\"]".to_string(),
                timeout_ms: 5000,
            }]
        );
    }

    #[tokio::test]
    async fn page_lookup_of_missing_hook_times_out() {
        let query = Query::new(Locator::new(FakePage::new(TABLE)));

        let err = query.hook("missing").await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn element_lookup_of_missing_hook_is_absent() {
        let query = Query::new(Locator::new(FakePage::new(TABLE)));
        let table = query.hook("results").await.unwrap().unwrap();

        let scoped = Query::new(Locator::new(table));
        assert!(scoped.hook("missing").await.unwrap().is_none());
        assert!(scoped.hooks("missing").await.unwrap().is_empty());
        assert_eq!(scoped.hooks("row").await.unwrap().len(), 3);
    }
}
