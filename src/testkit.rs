use crate::capabilities::{Click, Evaluate, Query};
use crate::core::Scope;
use crate::dom::Locator;
use crate::errors::{HarnessError, Result};

/// Query/Click/Evaluate bound to any page or element, the building block of
/// page objects.
///
/// ```no_run
/// # use quix_e2e::{Driver, ChromePage, Testkit, Result};
/// # async fn run(driver: &Driver<ChromePage>) -> Result<()> {
/// let sidebar = Testkit::new(driver.query.hook("sidebar").await?)?;
/// sidebar.click.hook("new-note").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Testkit<S: Scope> {
    pub query: Query<S>,
    pub click: Click<S>,
    pub evaluate: Evaluate<S>,
}

impl<S: Scope> Testkit<S> {
    /// Fails right away when there is no page or element to bind to.
    pub fn new(scope: Option<S>) -> Result<Self> {
        scope
            .map(Self::from_scope)
            .ok_or_else(|| HarnessError::Usage("Got null page or element".to_string()))
    }

    pub fn from_scope(scope: S) -> Self {
        Self::from_locator(Locator::new(scope))
    }

    pub(crate) fn from_locator(locator: Locator<S>) -> Self {
        Self {
            query: Query::new(locator.clone()),
            click: Click::new(locator.clone()),
            evaluate: Evaluate::new(locator),
        }
    }
}
