//! Scriptable in-memory browser for navigator tests.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::{BrowserDriver, BrowserLauncher, Locator};

/// Page state shared between a fake launcher, its sessions and the test.
#[derive(Debug, Default)]
pub struct FakePage {
    /// Elements that exist.
    pub present: HashSet<Locator>,
    /// Elements that exist and are rendered.
    pub visible: HashSet<Locator>,
    /// Results returned by successive `evaluate` calls; `Null` once drained.
    pub evaluations: VecDeque<Value>,
    pub fail_navigation: bool,
    pub fail_evaluate: bool,

    pub navigated: Vec<String>,
    pub clicks: Vec<Locator>,
    pub keys: Vec<String>,
    pub evaluate_calls: usize,
    pub launches: usize,
    pub closes: usize,
}

impl FakePage {
    pub fn with_body() -> Self {
        let mut page = Self::default();
        page.present.insert(Locator::css("body"));
        page
    }

    pub fn add_present(&mut self, locator: Locator) {
        self.present.insert(locator);
    }

    pub fn add_visible(&mut self, locator: Locator) {
        self.present.insert(locator.clone());
        self.visible.insert(locator);
    }

    pub fn push_evaluation(&mut self, value: Value) {
        self.evaluations.push_back(value);
    }
}

pub struct FakeBrowser {
    page: Arc<Mutex<FakePage>>,
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let mut page = self.page.lock().unwrap();
        page.navigated.push(url.to_string());
        if page.fail_navigation {
            anyhow::bail!("net::ERR_CONNECTION_RESET");
        }
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> Result<Value> {
        let mut page = self.page.lock().unwrap();
        page.evaluate_calls += 1;
        if page.fail_evaluate {
            anyhow::bail!("Execution context was destroyed");
        }
        Ok(page.evaluations.pop_front().unwrap_or(Value::Null))
    }

    async fn find(&mut self, locator: &Locator) -> Result<bool> {
        Ok(self.page.lock().unwrap().present.contains(locator))
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        Ok(self.page.lock().unwrap().visible.contains(locator))
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        let mut page = self.page.lock().unwrap();
        if !page.present.contains(locator) {
            anyhow::bail!("Element not found for click: {}", locator);
        }
        page.clicks.push(locator.clone());
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<()> {
        self.page.lock().unwrap().keys.push(key.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.page.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Hands out sessions over one shared [`FakePage`].
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub page: Arc<Mutex<FakePage>>,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            fail_launch: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub fn page(&self) -> std::sync::MutexGuard<'_, FakePage> {
        self.page.lock().unwrap()
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>> {
        if self.fail_launch {
            anyhow::bail!("Chrome/Chromium not found");
        }
        self.page.lock().unwrap().launches += 1;
        Ok(Box::new(FakeBrowser {
            page: Arc::clone(&self.page),
        }))
    }
}
