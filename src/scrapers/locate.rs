//! Ordered fallback strategies for finding and triggering page controls.
//!
//! Listing markup changes often, so every control (gallery link, lightbox
//! trigger, "next" button) is reached through a list of strategies tried in
//! priority order. The first strategy that fires wins and is logged.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::browser::{BrowserDriver, Locator};

/// One way of reaching a page control.
#[async_trait]
pub trait LocateStrategy: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Try to find and invoke the control. `Ok(true)` if it fired.
    async fn attempt(&self, driver: &mut dyn BrowserDriver) -> Result<bool>;
}

/// Find an element, optionally require it to be visible, then click it.
pub struct ClickStrategy {
    locator: Locator,
    wait: Duration,
    require_visible: bool,
}

impl ClickStrategy {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            wait: Duration::ZERO,
            require_visible: false,
        }
    }

    /// Wait up to `wait` for the element to appear.
    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Skip elements that exist but are not rendered.
    pub fn visible_only(mut self) -> Self {
        self.require_visible = true;
        self
    }
}

#[async_trait]
impl LocateStrategy for ClickStrategy {
    fn describe(&self) -> String {
        format!("click {}", self.locator)
    }

    async fn attempt(&self, driver: &mut dyn BrowserDriver) -> Result<bool> {
        if !driver.wait_for(&self.locator, self.wait).await? {
            return Ok(false);
        }
        if self.require_visible && !driver.is_visible(&self.locator).await? {
            return Ok(false);
        }
        driver.click(&self.locator).await?;
        Ok(true)
    }
}

/// Press a key on the document. Always fires unless the browser errors.
pub struct KeyPressStrategy {
    key: String,
}

impl KeyPressStrategy {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl LocateStrategy for KeyPressStrategy {
    fn describe(&self) -> String {
        format!("key {}", self.key)
    }

    async fn attempt(&self, driver: &mut dyn BrowserDriver) -> Result<bool> {
        driver.press_key(&self.key).await?;
        Ok(true)
    }
}

/// A named, prioritized list of strategies for one control.
pub struct StrategyChain {
    name: &'static str,
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl StrategyChain {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl LocateStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy in order. Returns the description of the one that
    /// fired, or `None` if all of them missed or failed.
    pub async fn run(&self, driver: &mut dyn BrowserDriver) -> Option<String> {
        for strategy in &self.strategies {
            match strategy.attempt(driver).await {
                Ok(true) => {
                    let description = strategy.describe();
                    info!("{}: {}", self.name, description);
                    return Some(description);
                }
                Ok(false) => debug!("{}: no match for {}", self.name, strategy.describe()),
                Err(e) => debug!("{}: {} failed: {:#}", self.name, strategy.describe(), e),
            }
        }
        None
    }
}
