//! Photo candidates discovered on listing pages.
//!
//! Listing pages reference the same photo at several sizes, with CDN
//! size/quality markers baked into the path. Candidates are normalized to a
//! single canonical high-quality URL and keyed by the underlying asset so that
//! one photo is only fetched once.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Dimension recorded when the browser cannot report one.
pub const FALLBACK_DIMENSION: u32 = 0;

/// Query appended to CDN URLs that carry no explicit size.
pub const CANONICAL_QUERY: &str = "width=1200&quality=80";

/// CDN path markers that pin a size or transformation.
const SIZE_MARKERS: &[&str] = &[";s=", ";t="];

static FILES_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/files/([^/;?]+)").unwrap());

/// A photo reference as scraped from the DOM, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPhoto {
    pub src: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// A normalized photo URL with the footprint observed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoCandidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoCandidate {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    /// Build a candidate from a raw DOM scan entry.
    ///
    /// Returns `None` when the source is empty after normalization.
    pub fn from_raw(raw: &RawPhoto) -> Option<Self> {
        let url = normalize_url(&raw.src);
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url,
            width: raw.width.unwrap_or(FALLBACK_DIMENSION),
            height: raw.height.unwrap_or(FALLBACK_DIMENSION),
        })
    }

    /// Key identifying the underlying photo asset.
    pub fn identity_key(&self) -> String {
        identity_key(&self.url)
    }

    /// True if both dimensions are strictly larger than `other`'s.
    pub fn dominates(&self, other: &PhotoCandidate) -> bool {
        self.width > other.width && self.height > other.height
    }

    /// True if both dimensions reach the given minimums.
    pub fn meets_minimum(&self, min_width: u32, min_height: u32) -> bool {
        self.width >= min_width && self.height >= min_height
    }
}

/// Normalize a CDN photo URL to its canonical high-quality form.
pub fn normalize_url(src: &str) -> String {
    let mut url: String = src.chars().filter(|c| !c.is_whitespace()).collect();
    if url.is_empty() {
        return url;
    }

    for marker in SIZE_MARKERS {
        if let Some(pos) = url.find(marker) {
            url.truncate(pos);
        }
    }

    if !url.contains("width=") {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(CANONICAL_QUERY);
    }

    url
}

/// Derive the photo identity key from a URL.
///
/// Prefers the asset token after `/files/`, then the last path segment
/// stripped of CDN parameters, then the URL itself.
pub fn identity_key(url: &str) -> String {
    if let Some(caps) = FILES_SEGMENT.captures(url) {
        return caps[1].to_string();
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(path);

    path.rsplit('/')
        .map(|segment| segment.split(';').next().unwrap_or(segment))
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.to_string())
}

/// Ordered collection of candidates, unique by identity key.
///
/// On a key collision the incoming candidate replaces the stored one only if
/// it is strictly larger in both dimensions; the original position is kept.
#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    order: Vec<String>,
    by_key: HashMap<String, PhotoCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate. Returns true if the key was not present before.
    pub fn insert(&mut self, candidate: PhotoCandidate) -> bool {
        let key = candidate.identity_key();
        match self.by_key.get_mut(&key) {
            Some(existing) => {
                if candidate.dominates(existing) {
                    *existing = candidate;
                }
                false
            }
            None => {
                self.order.push(key.clone());
                self.by_key.insert(key, candidate);
                true
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = PhotoCandidate>>(&mut self, candidates: I) {
        for candidate in candidates {
            self.insert(candidate);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Candidates in first-seen order.
    pub fn into_vec(mut self) -> Vec<PhotoCandidate> {
        self.order
            .iter()
            .filter_map(|key| self.by_key.remove(key))
            .collect()
    }
}

/// Drop repeated URLs, keeping the first position. A repeat that is strictly
/// larger in both dimensions replaces the recorded footprint.
pub fn dedup_by_url(candidates: Vec<PhotoCandidate>) -> Vec<PhotoCandidate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<PhotoCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match index.get(&candidate.url) {
            Some(&i) => {
                if candidate.dominates(&out[i]) {
                    out[i] = candidate;
                }
            }
            None => {
                index.insert(candidate.url.clone(), out.len());
                out.push(candidate);
            }
        }
    }
    out
}
