//! Service layer: turning photo URLs into delivered albums.
//!
//! Services are independent of Telegram. The bot shell injects an
//! [`AlbumSink`] and the tests inject fakes for both seams.

pub mod delivery;
pub mod fetch;
pub mod watermark;

pub use delivery::{content_hash, encode_jpeg, AlbumPhoto, AlbumSink, PhotoPipeline, PipelineConfig};
pub use fetch::{decode_image, FetchError, ImageFetcher, ImageSource};
