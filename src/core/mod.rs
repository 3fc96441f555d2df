pub mod browser;
pub mod config;

pub use browser::{BrowserTrait, ElementHandle, Page, Scope};
pub use config::{BrowserConfig, Config, DriverConfig, ServerConfig, Viewport};
