//! End-to-end test harness for a browser single-page application.
//!
//! A [`Driver`] owns one page of a shared browser and exposes the
//! selector-driven capabilities (`query`, `click`, `evaluate`, `url`, `log`)
//! plus a [`MockController`] for the application's mock-HTTP endpoint.
//! [`Testkit`] binds the same capabilities to any element, which is how page
//! objects are built. [`ServerProcess`] supervises the backend under test.

pub mod browser;
pub mod capabilities;
pub mod core;
pub mod dom;
pub mod driver;
pub mod errors;
pub mod mock;
pub mod poller;
pub mod server;
pub mod testkit;
pub mod types;
pub mod utils;

#[cfg(test)]
mod testing;

#[cfg(feature = "chrome")]
pub use browser::{ChromeBrowser, ChromeElement, ChromePage};
pub use capabilities::{Click, Evaluate, Log, Query, UrlMatcher};
pub use core::{
    BrowserConfig, BrowserTrait, Config, DriverConfig, ElementHandle, Page, Scope, ServerConfig,
    Viewport,
};
pub use driver::Driver;
pub use errors::{HarnessError, Result};
pub use mock::MockController;
pub use poller::{retry, RetryPolicy};
pub use server::{start_server, ProcessState, ServerProcess, StopHandle};
pub use testkit::Testkit;
pub use types::Selector;
