//! OLX: inline photos, then page through the lightbox.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::scripts::{
    scan_script, OLX_CDN_HOSTS, OLX_MAIN_PHOTO_SELECTORS, OLX_NEXT_SELECTORS, OLX_NEXT_XPATHS,
    OLX_OVERLAY_PHOTO_SELECTORS, OLX_OVERLAY_SELECTORS, OLX_PAGE_SELECTORS,
};
use super::{scan, GalleryConfig};
use crate::models::{dedup_by_url, PhotoCandidate};
use crate::scrapers::browser::{BrowserDriver, Locator};
use crate::scrapers::locate::{ClickStrategy, KeyPressStrategy, StrategyChain};

pub(super) async fn discover(
    driver: &mut dyn BrowserDriver,
    config: &GalleryConfig,
) -> Vec<PhotoCandidate> {
    let script = scan_script(OLX_PAGE_SELECTORS, OLX_CDN_HOSTS, false);
    let mut photos = match scan(driver, &script).await {
        Ok(photos) => photos,
        Err(e) => {
            warn!("OLX page scan failed: {:#}", e);
            Vec::new()
        }
    };
    info!("OLX listing page shows {} photos", photos.len());

    if open_lightbox(driver, config).await {
        let gallery = page_through(driver, config).await;
        info!("OLX lightbox yielded {} photos", gallery.len());
        photos.extend(gallery);
    }

    dedup_by_url(photos)
}

/// Click the main photo to open the lightbox.
///
/// Returns false only when no trigger could be clicked; an overlay that
/// cannot be confirmed visible is assumed to be open.
async fn open_lightbox(driver: &mut dyn BrowserDriver, config: &GalleryConfig) -> bool {
    let trigger = OLX_MAIN_PHOTO_SELECTORS
        .iter()
        .fold(StrategyChain::new("olx lightbox"), |chain, selector| {
            chain.then(ClickStrategy::new(Locator::css(*selector)).wait(config.element_wait()))
        });

    if trigger.run(driver).await.is_none() {
        info!("No lightbox trigger found on OLX listing");
        return false;
    }

    tokio::time::sleep(config.step_delay()).await;

    for selector in OLX_OVERLAY_SELECTORS {
        match driver.is_visible(&Locator::css(*selector)).await {
            Ok(true) => {
                debug!("Lightbox confirmed by {}", selector);
                return true;
            }
            Ok(false) => {}
            Err(e) => debug!("Overlay check {} failed: {:#}", selector, e),
        }
    }

    debug!("Lightbox overlay not confirmed, assuming it opened");
    true
}

fn next_photo_chain() -> StrategyChain {
    let chain = OLX_NEXT_SELECTORS
        .iter()
        .fold(StrategyChain::new("olx next photo"), |chain, selector| {
            chain.then(ClickStrategy::new(Locator::css(*selector)).visible_only())
        });
    let chain = OLX_NEXT_XPATHS.iter().fold(chain, |chain, xpath| {
        chain.then(ClickStrategy::new(Locator::xpath(*xpath)).visible_only())
    });
    chain.then(KeyPressStrategy::new("ArrowRight"))
}

/// Collect overlay photos step by step until the cap or exhaustion.
async fn page_through(
    driver: &mut dyn BrowserDriver,
    config: &GalleryConfig,
) -> Vec<PhotoCandidate> {
    let script = scan_script(OLX_OVERLAY_PHOTO_SELECTORS, OLX_CDN_HOSTS, true);
    let next = next_photo_chain();

    let mut seen = HashSet::new();
    let mut collected = Vec::new();
    let mut idle = 0;

    loop {
        let batch = match scan(driver, &script).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("OLX lightbox scan failed: {:#}", e);
                Vec::new()
            }
        };

        let mut added = 0;
        for photo in batch {
            if collected.len() >= config.max_photos {
                break;
            }
            if seen.insert(photo.url.clone()) {
                collected.push(photo);
                added += 1;
            }
        }

        if collected.len() >= config.max_photos {
            info!("Reached lightbox limit of {} photos", config.max_photos);
            break;
        }

        if added == 0 {
            idle += 1;
            if idle >= config.max_idle_iterations {
                debug!("No new photos for {} steps, gallery exhausted", idle);
                break;
            }
        } else {
            idle = 0;
        }

        if next.run(driver).await.is_none() {
            debug!("No way to advance the lightbox");
            break;
        }

        tokio::time::sleep(config.step_delay()).await;
    }

    collected
}
