//! Otodom watermark removal.
//!
//! Otodom stamps its logo into a band along the bottom of every photo. The
//! band is proportionally taller on smaller images, so the share of the height
//! that is kept grows with the image height.

use image::DynamicImage;

/// Percentage of the height kept for an image `height` pixels tall.
pub fn kept_percent(height: u32) -> u32 {
    match height {
        h if h > 800 => 92,
        h if h > 600 => 90,
        h if h > 400 => 88,
        _ => 85,
    }
}

/// Cut the bottom watermark band off. Width is unchanged.
///
/// Images too small to keep a single row are returned as is.
pub fn crop(image: DynamicImage) -> DynamicImage {
    let height = image.height();
    let kept = (u64::from(height) * u64::from(kept_percent(height)) / 100) as u32;
    if kept == 0 {
        return image;
    }
    image.crop_imm(0, 0, image.width(), kept)
}
