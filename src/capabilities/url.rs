use crate::core::Page;
use crate::dom::WAIT_TIMEOUT;
use crate::errors::Result;
use crate::utils::javascript::URL_MATCHES_FN;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Matches the hash-routed location against a `UrlPattern` inside the page.
#[derive(Clone)]
pub struct UrlMatcher<P: Page> {
    page: P,
    timeout: Duration,
}

impl<P: Page> UrlMatcher<P> {
    pub fn new(page: P) -> Self {
        Self::with_timeout(page, WAIT_TIMEOUT)
    }

    pub fn with_timeout(page: P, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    /// Resolves `true` once the current state matches `pattern`; otherwise the
    /// page's wait fails with its timeout error.
    pub async fn matches(&self, pattern: &str) -> Result<bool> {
        debug!(pattern, "waiting for url to match");
        self.page
            .wait_for_function(URL_MATCHES_FN, vec![json!(pattern)], self.timeout)
            .await?;
        Ok(true)
    }
}
