//! End-to-end delivery scenarios against in-memory image sources and sinks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};

use adphotos::models::SiteVariant;
use adphotos::services::{
    AlbumPhoto, AlbumSink, FetchError, ImageSource, PhotoPipeline, PipelineConfig,
};

/// Serves a fixed image per URL.
#[derive(Default)]
struct StaticSource {
    images: HashMap<String, DynamicImage>,
}

impl StaticSource {
    fn insert(&mut self, url: &str, image: DynamicImage) {
        self.images.insert(url.to_string(), image);
    }
}

#[async_trait]
impl ImageSource for StaticSource {
    async fn fetch(&self, url: &str, _site: SiteVariant) -> Result<DynamicImage, FetchError> {
        self.images
            .get(url)
            .cloned()
            .ok_or(FetchError::TooSmall { len: 0, min: 1000 })
    }
}

#[derive(Default)]
struct CollectingSink {
    albums: Mutex<Vec<Vec<AlbumPhoto>>>,
}

impl CollectingSink {
    fn album_sizes(&self) -> Vec<usize> {
        self.albums.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn photos(&self) -> Vec<AlbumPhoto> {
        self.albums.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl AlbumSink for CollectingSink {
    async fn send_album(&self, photos: Vec<AlbumPhoto>) -> anyhow::Result<()> {
        self.albums.lock().unwrap().push(photos);
        Ok(())
    }
}

/// A photo whose pixels are unique to `seed`.
fn photo(seed: u32, width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (seed % 256) as u8,
            (seed / 256 % 256) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

fn cdn_url(id: &str) -> String {
    format!(
        "https://ireland.apollo.olxcdn.com/v1/files/{}/image?width=1200&quality=80",
        id
    )
}

fn pipeline(source: StaticSource) -> PhotoPipeline {
    let config = PipelineConfig {
        album_delay_ms: 0,
        ..PipelineConfig::default()
    };
    PhotoPipeline::new(Arc::new(source), config)
}

#[tokio::test]
async fn otodom_listing_with_twelve_photos_sends_two_cropped_albums() {
    let mut source = StaticSource::default();
    let mut urls = Vec::new();
    for i in 0..12 {
        let url = cdn_url(&format!("otodom{}", i));
        source.insert(&url, photo(i, 1024, 768));
        urls.push(url);
    }
    let sink = CollectingSink::default();

    let count = pipeline(source)
        .deliver(&urls, SiteVariant::Otodom, &sink)
        .await;

    assert_eq!(count, 12);
    assert_eq!(sink.album_sizes(), vec![10, 2]);
    for photo in sink.photos() {
        assert_eq!(photo.width, 1024);
        // 768 > 600: 90% kept
        assert_eq!(photo.height, 691);
        let decoded = image::load_from_memory(&photo.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 691));
    }
}

#[tokio::test]
async fn olx_listing_with_repeated_pixels_sends_one_uncropped_album() {
    let mut source = StaticSource::default();
    let urls: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|id| cdn_url(id)).collect();
    source.insert(&urls[0], photo(1, 800, 600));
    source.insert(&urls[1], photo(2, 800, 600));
    source.insert(&urls[2], photo(3, 800, 600));
    // Same pixels as "b" under a different asset id.
    source.insert(&urls[3], photo(2, 800, 600));
    source.insert(&urls[4], photo(5, 800, 600));
    let sink = CollectingSink::default();

    let count = pipeline(source).deliver(&urls, SiteVariant::Olx, &sink).await;

    assert_eq!(count, 4);
    assert_eq!(sink.album_sizes(), vec![4]);
    assert!(sink
        .photos()
        .iter()
        .all(|p| (p.width, p.height) == (800, 600)));
}

#[tokio::test]
async fn chunks_follow_album_size() {
    for n in [1usize, 9, 10, 11, 20, 23] {
        let mut source = StaticSource::default();
        let urls: Vec<String> = (0..n)
            .map(|i| {
                let url = cdn_url(&format!("p{}", i));
                source.insert(&url, photo(i as u32, 400, 400));
                url
            })
            .collect();
        let sink = CollectingSink::default();

        let count = pipeline(source).deliver(&urls, SiteVariant::Olx, &sink).await;

        let mut expected = vec![10; n / 10];
        if n % 10 != 0 {
            expected.push(n % 10);
        }
        assert_eq!(count, n, "n = {}", n);
        assert_eq!(sink.album_sizes(), expected, "n = {}", n);
    }
}

#[tokio::test]
async fn delivered_photos_never_repeat_pixels() {
    let mut source = StaticSource::default();
    let urls: Vec<String> = (0..25)
        .map(|i| {
            let url = cdn_url(&format!("dup{}", i));
            // Only five distinct pictures behind 25 asset ids.
            source.insert(&url, photo(i % 5, 500, 500));
            url
        })
        .collect();
    let sink = CollectingSink::default();

    let count = pipeline(source).deliver(&urls, SiteVariant::Olx, &sink).await;

    assert_eq!(count, 5);
    assert_eq!(sink.album_sizes(), vec![5]);
}
