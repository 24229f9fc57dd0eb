//! Otodom: open the photo gallery, then scan it.

use tracing::{info, warn};

use super::scripts::{
    scan_script, OTODOM_CDN_HOSTS, OTODOM_GALLERY_GENERIC_TAGS, OTODOM_GALLERY_LABELS,
    OTODOM_GALLERY_LINK_TAGS, OTODOM_PHOTO_SELECTORS,
};
use super::{scan, GalleryConfig};
use crate::models::PhotoCandidate;
use crate::scrapers::browser::{BrowserDriver, Locator};
use crate::scrapers::locate::{ClickStrategy, StrategyChain};

pub(super) async fn discover(
    driver: &mut dyn BrowserDriver,
    config: &GalleryConfig,
) -> Vec<PhotoCandidate> {
    let affordance = StrategyChain::new("otodom gallery")
        .then(
            ClickStrategy::new(Locator::text(
                OTODOM_GALLERY_LINK_TAGS,
                OTODOM_GALLERY_LABELS,
            ))
            .wait(config.element_wait()),
        )
        .then(ClickStrategy::new(Locator::text(
            OTODOM_GALLERY_GENERIC_TAGS,
            OTODOM_GALLERY_LABELS,
        )));

    // Without the gallery page only a few teaser photos are rendered.
    if affordance.run(driver).await.is_none() {
        info!("No gallery control found on Otodom listing");
        return Vec::new();
    }

    tokio::time::sleep(config.settle_delay()).await;

    let script = scan_script(OTODOM_PHOTO_SELECTORS, OTODOM_CDN_HOSTS, false);
    match scan(driver, &script).await {
        Ok(photos) => {
            info!("Otodom gallery scan found {} photos", photos.len());
            photos
        }
        Err(e) => {
            warn!("Otodom gallery scan failed: {:#}", e);
            Vec::new()
        }
    }
}
