pub mod locator;

pub use locator::{Locator, WAIT_TIMEOUT};
