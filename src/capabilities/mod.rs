//! Selector-driven operations over a page or element scope.

pub mod click;
pub mod evaluate;
pub mod log;
pub mod query;
pub mod url;

pub use click::Click;
pub use evaluate::Evaluate;
pub use log::Log;
pub use query::Query;
pub use url::UrlMatcher;
