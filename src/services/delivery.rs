//! Photo delivery pipeline.
//!
//! Turns discovered photo URLs into JPEG albums: fetch each photo once, drop
//! repeats by identity key and by decoded content, crop the watermark where
//! the site needs it, and hand bounded batches to an [`AlbumSink`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::fetch::ImageSource;
use super::watermark;
use crate::models::{identity_key, SiteVariant};
use crate::scrapers::MinSize;

/// Pipeline limits and pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Photos per album (Telegram media groups hold at most 10).
    pub photos_per_album: usize,
    pub min_width: u32,
    pub min_height: u32,
    pub jpeg_quality: u8,
    /// Pause after each album send attempt, in milliseconds.
    pub album_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Bodies shorter than this are not images worth decoding.
    pub min_image_bytes: usize,
    /// Overrides the desktop Chrome user agent.
    pub user_agent: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            photos_per_album: 10,
            min_width: 300,
            min_height: 300,
            jpeg_quality: 90,
            album_delay_ms: 1000,
            request_timeout_secs: 30,
            min_image_bytes: 1000,
            user_agent: None,
        }
    }
}

impl PipelineConfig {
    pub fn min_size(&self) -> MinSize {
        MinSize {
            width: self.min_width,
            height: self.min_height,
        }
    }

    pub fn album_delay(&self) -> Duration {
        Duration::from_millis(self.album_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// One encoded photo ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Destination for finished albums.
#[async_trait]
pub trait AlbumSink: Send + Sync {
    async fn send_album(&self, photos: Vec<AlbumPhoto>) -> anyhow::Result<()>;
}

/// SHA-256 over the RGB8 pixel buffer, hex encoded.
pub fn content_hash(image: &DynamicImage) -> String {
    let digest = match image {
        DynamicImage::ImageRgb8(buf) => Sha256::digest(buf.as_raw()),
        other => Sha256::digest(other.to_rgb8().as_raw()),
    };
    hex::encode(digest)
}

/// Encode as baseline JPEG.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    image.write_with_encoder(encoder)?;
    Ok(bytes)
}

/// Fetches, filters and batches listing photos.
pub struct PhotoPipeline {
    source: Arc<dyn ImageSource>,
    config: PipelineConfig,
}

impl PhotoPipeline {
    pub fn new(source: Arc<dyn ImageSource>, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Deliver `urls` in albums through `sink`.
    ///
    /// Returns the number of photos that made it into a batch. Fetch, decode
    /// and encode failures drop the photo; a failed send drops that album and
    /// the next one is still attempted.
    pub async fn deliver(&self, urls: &[String], site: SiteVariant, sink: &dyn AlbumSink) -> usize {
        let min_size = self.config.min_size();
        let album_size = self.config.photos_per_album.max(1);
        let mut seen_keys = HashSet::new();
        let mut seen_hashes = HashSet::new();
        let mut accepted = 0;

        for (index, chunk) in urls.chunks(album_size).enumerate() {
            let mut batch = Vec::with_capacity(chunk.len());

            for url in chunk {
                let key = identity_key(url);
                if seen_keys.contains(&key) {
                    debug!("Skipping repeated photo {}", key);
                    continue;
                }

                let image = match self.source.fetch(url, site).await {
                    Ok(image) => image,
                    Err(e) => {
                        debug!("Skipping {}: {}", url, e);
                        continue;
                    }
                };

                if !min_size.allows(image.width(), image.height()) {
                    debug!(
                        "Skipping {}: {}x{} is below {}x{}",
                        url,
                        image.width(),
                        image.height(),
                        min_size.width,
                        min_size.height
                    );
                    continue;
                }

                let hash = content_hash(&image);
                if !seen_hashes.insert(hash) {
                    debug!("Skipping {}: same pixels as an earlier photo", url);
                    continue;
                }
                seen_keys.insert(key);

                let image = if site.requires_watermark_removal() {
                    watermark::crop(image)
                } else {
                    image
                };

                match encode_jpeg(&image, self.config.jpeg_quality) {
                    Ok(bytes) => batch.push(AlbumPhoto {
                        bytes,
                        width: image.width(),
                        height: image.height(),
                    }),
                    Err(e) => warn!("Failed to encode {}: {}", url, e),
                }
            }

            if batch.is_empty() {
                continue;
            }

            let size = batch.len();
            accepted += size;
            match sink.send_album(batch).await {
                Ok(()) => info!("Sent album {} with {} photos", index + 1, size),
                Err(e) => warn!("Failed to send album {}: {:#}", index + 1, e),
            }
            tokio::time::sleep(self.config.album_delay()).await;
        }

        accepted
    }
}
