//! adphotos - listing photo collector for Telegram.
//!
//! Takes an otodom.pl or olx.pl listing link, walks the listing's photo
//! gallery in a headless browser, downloads and deduplicates the photos,
//! crops the Otodom watermark and posts everything back as albums.

pub mod bot;
pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod scrapers;
pub mod server;
pub mod services;
pub mod supervisor;
