//! Data models for adphotos.

mod photo;
mod site;

pub use photo::{
    dedup_by_url, identity_key, normalize_url, CandidateSet, PhotoCandidate, RawPhoto,
    CANONICAL_QUERY, FALLBACK_DIMENSION,
};
pub use site::{is_listing_url, SiteVariant};
