#[cfg(feature = "chrome")]
pub mod chrome;
pub mod wait;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeBrowser, ChromeElement, ChromePage};
pub use wait::poll_until_true;
