//! Headless browser capability used by the gallery navigator.
//!
//! The navigator only sees the narrow [`BrowserDriver`] interface: navigate,
//! evaluate a script, find, check visibility, click, press a key, wait and
//! close. The production implementation drives Chromium over CDP via
//! chromiumoxide; tests use an in-memory fake.

#[cfg(feature = "browser")]
mod chrome;
mod config;
#[cfg(test)]
pub(crate) mod fake;
mod locator;
#[cfg(feature = "browser")]
mod stealth;

#[cfg(feature = "browser")]
pub use chrome::{ChromeLauncher, ChromeSession};
pub use config::{default_headless, default_timeout, BrowserEngineConfig, BrowserEngineType};
pub use locator::Locator;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;

/// Interval between presence checks in [`BrowserDriver::wait_for`].
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One exclusive browser session.
#[async_trait]
pub trait BrowserDriver: Send {
    /// Start navigating to `url`. Does not wait for the page to load.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression and return its JSON value.
    ///
    /// `undefined` results come back as `Value::Null`.
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Whether an element matching `locator` exists.
    async fn find(&mut self, locator: &Locator) -> Result<bool>;

    /// Whether an element matching `locator` exists and is rendered.
    async fn is_visible(&mut self, locator: &Locator) -> Result<bool>;

    /// Scroll the element into view and invoke `click()` on it through the DOM,
    /// bypassing hit-testing so overlays cannot intercept the click.
    async fn click(&mut self, locator: &Locator) -> Result<()>;

    /// Dispatch a key press to the document body.
    async fn press_key(&mut self, key: &str) -> Result<()>;

    /// Tear the session down. Must be called exactly once.
    async fn close(&mut self) -> Result<()>;

    /// Poll for `locator` until it appears or `timeout` elapses.
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.find(locator).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }
}

/// Creates a fresh, isolated browser session per discovery run.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>>;
}

/// Launcher used when browser support is compiled out.
#[cfg(not(feature = "browser"))]
pub struct ChromeLauncher;

#[cfg(not(feature = "browser"))]
impl ChromeLauncher {
    pub fn new(_config: BrowserEngineConfig) -> Self {
        Self
    }

    pub fn with_user_agent(self, _user_agent: String) -> Self {
        self
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>> {
        Err(anyhow::anyhow!(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
        ))
    }
}
