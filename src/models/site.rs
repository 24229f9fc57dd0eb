//! Supported listing sites and URL routing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches the listing URLs the bot accepts from chat text.
static LISTING_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(www\.)?(otodom\.pl|olx\.pl)/").expect("listing URL pattern is valid")
});

/// The marketplace a listing belongs to.
///
/// Each site has its own gallery markup and post-processing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteVariant {
    /// otodom.pl - photos live behind a gallery page and carry a watermark band.
    Otodom,
    /// olx.pl - photos are inline and in a lightbox, no watermark.
    Olx,
}

impl SiteVariant {
    /// Classify a listing URL. Anything that is not OLX is treated as Otodom.
    pub fn classify(url: &str) -> Self {
        if url.contains("olx.pl") {
            Self::Olx
        } else {
            Self::Otodom
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Otodom => "otodom",
            Self::Olx => "olx",
        }
    }

    /// Human-facing site name for status messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Otodom => "Otodom",
            Self::Olx => "OLX",
        }
    }

    /// Whether delivered photos need the bottom watermark band cropped off.
    pub fn requires_watermark_removal(&self) -> bool {
        matches!(self, Self::Otodom)
    }

    /// Referer sent with image downloads.
    pub fn referer(&self) -> &'static str {
        match self {
            Self::Otodom => "https://www.otodom.pl/",
            Self::Olx => "https://www.olx.pl/",
        }
    }
}

impl fmt::Display for SiteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Check whether chat text is a listing URL on a supported site.
pub fn is_listing_url(text: &str) -> bool {
    LISTING_URL.is_match(text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_olx() {
        assert_eq!(
            SiteVariant::classify("https://www.olx.pl/d/oferta/mieszkanie-CID3-ID1.html"),
            SiteVariant::Olx
        );
    }

    #[test]
    fn test_classify_defaults_to_otodom() {
        assert_eq!(
            SiteVariant::classify("https://www.otodom.pl/pl/oferta/mieszkanie-ID4abc"),
            SiteVariant::Otodom
        );
        assert_eq!(SiteVariant::classify("https://example.com/"), SiteVariant::Otodom);
    }

    #[test]
    fn test_watermark_only_for_otodom() {
        assert!(SiteVariant::Otodom.requires_watermark_removal());
        assert!(!SiteVariant::Olx.requires_watermark_removal());
    }

    #[test]
    fn test_is_listing_url() {
        assert!(is_listing_url("https://www.otodom.pl/pl/oferta/x"));
        assert!(is_listing_url("http://olx.pl/d/oferta/y"));
        assert!(is_listing_url("  https://olx.pl/d/oferta/y  "));
        assert!(!is_listing_url("https://www.olx.ua/d/oferta/y"));
        assert!(!is_listing_url("see https://www.otodom.pl/pl/oferta/x"));
        assert!(!is_listing_url("/start"));
    }
}
