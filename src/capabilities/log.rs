use crate::core::Page;
use crate::errors::Result;
use crate::utils::javascript::{BODY_HTML, LOCATION_HASH};
use tracing::info;

/// Debug output about the page under test.
#[derive(Clone)]
pub struct Log<P: Page> {
    page: P,
}

impl<P: Page> Log<P> {
    pub fn new(page: P) -> Self {
        Self { page }
    }

    /// Logs and returns the current hash state, without the leading `#`.
    pub async fn url(&self) -> Result<String> {
        let hash = self.page.evaluate(LOCATION_HASH).await?;
        let state = hash.as_str().unwrap_or("").replacen('#', "", 1);
        info!("Current page url is \"{}\"", state);
        Ok(state)
    }

    /// Logs and returns the body markup.
    pub async fn html(&self) -> Result<String> {
        let html = self.page.evaluate(BODY_HTML).await?;
        let html = html.as_str().unwrap_or("").to_string();
        info!("{}", html);
        Ok(html)
    }
}
