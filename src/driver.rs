use crate::capabilities::{Click, Evaluate, Log, Query, UrlMatcher};
use crate::core::{BrowserTrait, DriverConfig, Page};
use crate::dom::Locator;
use crate::errors::Result;
use crate::mock::MockController;
use crate::testkit::Testkit;
use std::time::Duration;
use tracing::info;

/// One test session: a page from the shared browser plus the capability
/// components bound to it.
pub struct Driver<P: Page> {
    page: P,
    base_url: String,
    session_id: String,
    wait_timeout: Duration,
    pub mock: MockController,
    pub url: UrlMatcher<P>,
    pub query: Query<P>,
    pub click: Click<P>,
    pub evaluate: Evaluate<P>,
    pub log: Log<P>,
}

impl<P: Page> Driver<P> {
    /// Open a page and wire everything to it. Unless the config says the
    /// backend is not mocked, the remote mock rules are reset before this returns.
    pub async fn init<B>(browser: &B, config: DriverConfig) -> Result<Self>
    where
        B: BrowserTrait<Page = P>,
    {
        let base_url = config.normalized_base_url()?;
        let timeout = Duration::from_millis(config.wait_timeout_ms);
        let page = browser.new_page().await?;
        let locator = Locator::with_timeout(page.clone(), timeout);
        let session_id = uuid::Uuid::new_v4().to_string();

        let driver = Self {
            mock: MockController::new(&base_url)?,
            url: UrlMatcher::with_timeout(page.clone(), timeout),
            query: Query::new(locator.clone()),
            click: Click::new(locator.clone()),
            evaluate: Evaluate::new(locator),
            log: Log::new(page.clone()),
            page,
            base_url,
            session_id,
            wait_timeout: timeout,
        };

        if config.mocked {
            driver.mock.reset().await?;
        }

        info!(session = %driver.session_id, base_url = %driver.base_url, mocked = config.mocked, "driver ready");
        Ok(driver)
    }

    /// Navigate to `{base_url}/#{state}`.
    pub async fn goto(&self, state: &str) -> Result<()> {
        self.page.goto(&format!("{}/#{}", self.base_url, state)).await
    }

    pub async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Build a page object over the whole page.
    pub fn create_testkit<T: From<Testkit<P>>>(&self) -> T {
        T::from(self.testkit())
    }

    pub fn testkit(&self) -> Testkit<P> {
        Testkit::from_locator(Locator::with_timeout(self.page.clone(), self.wait_timeout))
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
