//! Image download and decoding.
//!
//! Listing photos are fetched the way a browser viewing the listing would
//! fetch them: desktop Chrome user agent, the site's home page as Referer and
//! an image-first Accept header. Decoded images are normalized to RGB8 so the
//! content hash and the JPEG encoder see one pixel layout.

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::header::{ACCEPT, REFERER};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::models::SiteVariant;
use crate::scrapers::resolve_user_agent;

/// Accept header sent with image requests.
pub const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Why a photo could not be turned into a decoded image.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("Response too small ({len} bytes, need {min})")]
    TooSmall { len: usize, min: usize },

    #[error("Decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Source of decoded listing photos.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str, site: SiteVariant) -> Result<DynamicImage, FetchError>;
}

/// HTTP image fetcher.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    min_bytes: usize,
}

impl ImageFetcher {
    /// Create a fetcher.
    /// - `user_agent`: None for desktop Chrome, anything else is sent verbatim
    pub fn new(
        timeout: Duration,
        min_bytes: usize,
        user_agent: Option<&str>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, min_bytes })
    }
}

#[async_trait]
impl ImageSource for ImageFetcher {
    async fn fetch(&self, url: &str, site: SiteVariant) -> Result<DynamicImage, FetchError> {
        let response = self
            .client
            .get(url)
            .header(REFERER, site.referer())
            .header(ACCEPT, IMAGE_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("Fetched {} bytes from {}", bytes.len(), url);
        decode_image(&bytes, self.min_bytes)
    }
}

/// Decode an image body and normalize it to three-channel RGB.
pub fn decode_image(bytes: &[u8], min_bytes: usize) -> Result<DynamicImage, FetchError> {
    if bytes.len() < min_bytes {
        return Err(FetchError::TooSmall {
            len: bytes.len(),
            min: min_bytes,
        });
    }

    let image = image::load_from_memory(bytes)?;
    Ok(match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}
