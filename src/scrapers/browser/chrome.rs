//! Chromium sessions over CDP (chromiumoxide).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::stealth::STEALTH_SCRIPTS;
use super::{BrowserDriver, BrowserEngineConfig, BrowserEngineType, BrowserLauncher, Locator};
use crate::scrapers::user_agent::USER_AGENT;

/// Launches one Chromium instance per session, each with its own profile.
pub struct ChromeLauncher {
    config: BrowserEngineConfig,
    user_agent: String,
}

impl ChromeLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserEngineConfig) -> Self {
        Self {
            config,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the user agent reported by the page.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Find a Chrome executable on this machine.
    fn find_chrome() -> Result<PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        debug!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install chromium or set browser.remote_url"
        ))
    }

    async fn launch_local(&self) -> Result<ChromeSession> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let profile_dir = TempDir::new().context("Failed to create browser profile directory")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(profile_dir.path())
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--window-size=1920,1080");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        Ok(ChromeSession {
            browser,
            page: None,
            handler: spawn_handler(handler),
            profile_dir: Some(profile_dir),
            owned: true,
        })
    }

    async fn connect_remote(&self, url: &str) -> Result<ChromeSession> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .context("Failed to connect to remote browser")?
            .json()
            .await
            .context("Failed to parse browser version info")?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("No webSocketDebuggerUrl in response"))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let (browser, handler) = Browser::connect(ws_url)
            .await
            .context("Failed to connect to remote browser")?;

        Ok(ChromeSession {
            browser,
            page: None,
            handler: spawn_handler(handler),
            profile_dir: None,
            owned: false,
        })
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserDriver>> {
        let mut session = match self.config.remote_url {
            Some(ref remote_url) => self.connect_remote(remote_url).await?,
            None => self.launch_local().await?,
        };

        let stealth = self.config.engine == BrowserEngineType::Stealth;
        if let Err(e) = session.open_page(&self.user_agent, stealth).await {
            if let Err(close_err) = session.close().await {
                warn!("Failed to close browser after setup error: {:#}", close_err);
            }
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

fn spawn_handler(mut handler: chromiumoxide::Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    })
}

/// A browser with a single working tab.
pub struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    profile_dir: Option<TempDir>,
    /// Whether this session launched the browser process (and must stop it).
    owned: bool,
}

impl ChromeSession {
    async fn open_page(&mut self, user_agent: &str, stealth: bool) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;

        page.execute(SetUserAgentOverrideParams::new(user_agent.to_string()))
            .await?;

        if stealth {
            for script in STEALTH_SCRIPTS {
                page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
                    script.to_string(),
                ))
                .await?;
            }
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser session has no open page"))
    }

    async fn evaluate_bool(&mut self, script: String) -> Result<bool> {
        let value = self.evaluate(&script).await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl BrowserDriver for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid URL: {}", e))?;
        self.page()?.execute(nav_params).await?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let result = self.page()?.evaluate(script.to_string()).await?;
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn find(&mut self, locator: &Locator) -> Result<bool> {
        self.evaluate_bool(locator.find_script()).await
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        self.evaluate_bool(locator.visible_script()).await
    }

    async fn click(&mut self, locator: &Locator) -> Result<()> {
        if self.evaluate_bool(locator.click_script()).await? {
            Ok(())
        } else {
            Err(anyhow::anyhow!("Element not found for click: {}", locator))
        }
    }

    async fn press_key(&mut self, key: &str) -> Result<()> {
        let body = self.page()?.find_element("body").await?;
        body.press_key(key).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close tab: {}", e);
            }
        }

        let result = if self.owned {
            match self.browser.close().await {
                Ok(_) => {
                    let _ = self.browser.wait().await;
                    Ok(())
                }
                Err(e) => Err(anyhow::anyhow!("Failed to close browser: {}", e)),
            }
        } else {
            Ok(())
        };

        self.handler.abort();
        self.profile_dir.take();
        result
    }
}
