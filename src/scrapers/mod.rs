//! Listing scrapers: headless browser access and per-site gallery discovery.

pub mod browser;
pub mod gallery;
pub mod locate;
pub mod user_agent;

pub use browser::{BrowserDriver, BrowserEngineConfig, BrowserLauncher, ChromeLauncher, Locator};
pub use gallery::{GalleryConfig, GalleryNavigator, MinSize};
pub use user_agent::{resolve_user_agent, USER_AGENT};
