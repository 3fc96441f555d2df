use crate::core::config::normalize_base_url;
use crate::errors::Result;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct MockRule<'a, T: Serialize + ?Sized> {
    pattern: &'a str,
    payload: &'a T,
}

/// Client for the application's mock-HTTP endpoint.
///
/// Rules live on the remote side; this only forwards them. Responses are
/// not inspected beyond their status.
#[derive(Debug, Clone)]
pub struct MockController {
    client: reqwest::Client,
    base_url: String,
}

impl MockController {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Register a canned `payload` for requests matching `pattern`.
    pub async fn http<T: Serialize + ?Sized>(&self, pattern: &str, payload: &T) -> Result<()> {
        debug!(pattern, "registering mock");
        self.client
            .post(format!("{}/mock/pattern", self.base_url))
            .json(&MockRule { pattern, payload })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Drop every registered rule.
    pub async fn reset(&self) -> Result<()> {
        debug!("resetting mocks");
        self.client
            .get(format!("{}/mock/reset", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
