//! Photo discovery on listing pages.
//!
//! Each discovery run launches its own browser session, walks the
//! site-specific flow and always closes the session before returning.
//! Browser failures never escape: a failed stage contributes no photos.

mod olx;
mod otodom;
pub mod scripts;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::browser::{BrowserDriver, BrowserLauncher, Locator};
use crate::models::{CandidateSet, PhotoCandidate, RawPhoto, SiteVariant};

/// Timing and pagination limits for gallery discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// How long to wait for the listing document body, in seconds.
    pub page_load_timeout_secs: u64,
    /// Pause after load and after opening a gallery, for client-side rendering.
    pub settle_delay_ms: u64,
    /// How long to wait for each lightbox trigger candidate.
    pub element_wait_ms: u64,
    /// Pause after each lightbox interaction.
    pub step_delay_ms: u64,
    /// Stop paging the lightbox once this many photos were collected.
    pub max_photos: usize,
    /// Stop paging after this many consecutive steps without a new photo.
    pub max_idle_iterations: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_secs: 30,
            settle_delay_ms: 5000,
            element_wait_ms: 3000,
            step_delay_ms: 1000,
            max_photos: 50,
            max_idle_iterations: 3,
        }
    }
}

impl GalleryConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Minimum photo dimensions, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinSize {
    pub width: u32,
    pub height: u32,
}

impl Default for MinSize {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
        }
    }
}

impl MinSize {
    pub fn allows(&self, width: u32, height: u32) -> bool {
        width >= self.width && height >= self.height
    }
}

/// Drives a browser through a listing to find its photos.
pub struct GalleryNavigator {
    launcher: Arc<dyn BrowserLauncher>,
    config: GalleryConfig,
    min_size: MinSize,
}

impl GalleryNavigator {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: GalleryConfig, min_size: MinSize) -> Self {
        Self {
            launcher,
            config,
            min_size,
        }
    }

    /// Discover photo candidates for a listing.
    ///
    /// The result is unique by photo identity key and contains only candidates
    /// meeting the minimum size. Never fails; problems are logged.
    pub async fn discover(&self, url: &str, site: SiteVariant) -> Vec<PhotoCandidate> {
        info!("Starting {} photo discovery for {}", site, url);

        let mut driver = match self.launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                warn!("Could not start browser for {}: {:#}", url, e);
                return Vec::new();
            }
        };

        let found = self.run_flow(driver.as_mut(), url, site).await;

        if let Err(e) = driver.close().await {
            warn!("Failed to close browser session: {:#}", e);
        }

        let candidates = self.finalize(found);
        info!("{} discovery finished: {} photos", site, candidates.len());
        candidates
    }

    async fn run_flow(
        &self,
        driver: &mut dyn BrowserDriver,
        url: &str,
        site: SiteVariant,
    ) -> Vec<PhotoCandidate> {
        if let Err(e) = self.open_listing(driver, url).await {
            warn!("Failed to load listing {}: {:#}", url, e);
            return Vec::new();
        }

        match site {
            SiteVariant::Otodom => otodom::discover(driver, &self.config).await,
            SiteVariant::Olx => olx::discover(driver, &self.config).await,
        }
    }

    async fn open_listing(&self, driver: &mut dyn BrowserDriver, url: &str) -> Result<()> {
        driver.navigate(url).await?;

        let body = Locator::css("body");
        if !driver
            .wait_for(&body, self.config.page_load_timeout())
            .await
            .context("Waiting for document body")?
        {
            anyhow::bail!(
                "document body did not appear within {}s",
                self.config.page_load_timeout_secs
            );
        }

        tokio::time::sleep(self.config.settle_delay()).await;
        Ok(())
    }

    /// Apply the size floor, then merge by identity key (larger variant wins).
    ///
    /// Undersized variants never take part in the merge, so they cannot shadow
    /// a usable variant of the same photo.
    fn finalize(&self, candidates: Vec<PhotoCandidate>) -> Vec<PhotoCandidate> {
        let mut set = CandidateSet::new();
        set.extend(
            candidates
                .into_iter()
                .filter(|c| self.min_size.allows(c.width, c.height)),
        );
        set.into_vec()
    }
}

/// Run a scan script and parse its `[{src, width, height}]` result.
pub(crate) async fn scan(driver: &mut dyn BrowserDriver, script: &str) -> Result<Vec<PhotoCandidate>> {
    let value = driver.evaluate(script).await?;
    if value.is_null() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawPhoto> =
        serde_json::from_value(value).context("Unexpected photo scan result")?;
    Ok(raw.iter().filter_map(PhotoCandidate::from_raw).collect())
}
